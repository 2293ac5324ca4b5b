use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use hypercube::{
    assets::{AssetPaths, LoadedAssets},
    audio::{MoveSound, SoundCue},
    config::ViewerConfig,
    controller::{CameraController, FrameLoop, PanelAction, PropertyEditor},
    error::ViewerError,
    logging,
    mesh::Mesh,
    model::SceneObjectStore,
    ui::{EguiHost, ViewerUi},
    view::{GpuContext, SceneRenderer},
};

/// Everything that needs a window to exist
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: SceneRenderer,
    egui: EguiHost,
    ui: ViewerUi,
}

struct App {
    config: ViewerConfig,
    store: Rc<RefCell<SceneObjectStore>>,
    camera: Rc<RefCell<CameraController>>,
    editor: PropertyEditor,
    frame_loop: FrameLoop,
    mesh: Mesh,
    icons: Option<Vec<(PanelAction, egui::ColorImage)>>,
    graphics: Option<Graphics>,
    failure: Option<ViewerError>,
}

impl App {
    fn new(config: ViewerConfig, assets: LoadedAssets, cue: Rc<dyn SoundCue>) -> Self {
        let store = Rc::new(RefCell::new(SceneObjectStore::new()));
        store.borrow_mut().create_object();

        let camera = Rc::new(RefCell::new(CameraController::new(&config, cue)));
        let mut editor = PropertyEditor::new(store.clone());
        editor.read_fields();
        let frame_loop = FrameLoop::new(camera.clone());

        Self {
            config,
            store,
            camera,
            editor,
            frame_loop,
            mesh: assets.mesh,
            icons: Some(assets.icons),
            graphics: None,
            failure: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<Graphics, ViewerError> {
        let (width, height) = self.config.window_size;
        let attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        self.camera
            .borrow_mut()
            .camera_mut()
            .set_aspect(gpu.config.width, gpu.config.height);

        let renderer = SceneRenderer::new(&gpu, &self.mesh, &mut self.store.borrow_mut());
        let egui = EguiHost::new(&window, gpu.device.limits().max_texture_dimension_2d);
        let icons = self.icons.take().unwrap_or_default();
        let ui = ViewerUi::new(egui.context(), icons, self.config.icon_size);

        info!("window ready at {}x{}", gpu.config.width, gpu.config.height);
        Ok(Graphics {
            window,
            gpu,
            renderer,
            egui,
            ui,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        error!("{err}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };
        let Graphics {
            window,
            gpu,
            renderer,
            egui,
            ui,
        } = graphics;
        let camera = &self.camera;
        let editor = &mut self.editor;
        let fps = self.frame_loop.fps();

        let surface_size = [gpu.config.width, gpu.config.height];

        let mut output = None;
        self.frame_loop.run_frame(&mut || {
            output = Some(egui.run_ui(window, surface_size, |ctx| {
                ui.show(ctx, camera, editor, fps)
            }));
        });
        let Some(output) = output else {
            return;
        };

        renderer.update_camera(&gpu.queue, camera.borrow().camera());
        renderer.sync_instances(
            &gpu.device,
            &gpu.queue,
            &self.store.borrow(),
            Some(editor.current_index()),
        );

        match renderer.draw_frame(gpu, &output) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, shutting down");
                event_loop.exit();
            }
            Err(e) => warn!("frame skipped: {e:?}"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.init_graphics(event_loop) {
            Ok(graphics) => self.graphics = Some(graphics),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // The viewer has no keyboard or mouse bindings of its own.
        if let Some(graphics) = self.graphics.as_mut() {
            if graphics.egui.on_window_event(&graphics.window, &event) {
                graphics.window.request_redraw();
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(graphics) = self.graphics.as_mut() {
                    if graphics.gpu.resize(size.width, size.height) {
                        graphics
                            .renderer
                            .resize(&graphics.gpu.device, size.width, size.height);
                        self.camera
                            .borrow_mut()
                            .camera_mut()
                            .set_aspect(size.width, size.height);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }
}

fn main() -> Result<(), ViewerError> {
    logging::init();
    let config = ViewerConfig::from_env();
    info!("starting with assets from {}", config.asset_dir.display());

    let paths = AssetPaths::new(&config.asset_dir);
    let assets = LoadedAssets::load(&paths, config.icon_size).inspect_err(|e| error!("{e}"))?;
    let sound = MoveSound::load(&paths.sound, config.volume).inspect_err(|e| error!("{e}"))?;
    if !sound.is_audible() {
        warn!("running without sound output");
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, assets, Rc::new(sound));
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => {
            info!("goodbye");
            Ok(())
        }
    }
}
