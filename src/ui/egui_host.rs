use winit::event::WindowEvent;
use winit::window::Window;

/// Tessellated egui output for one frame, ready for the overlay pass
pub struct EguiFrameOutput {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
    pub screen_size_px: [u32; 2],
}

/// Owns the egui context and its winit glue for the viewer window
pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
}

impl EguiHost {
    /// `max_texture_side` comes from the device limits so egui never builds
    /// a font atlas the GPU cannot hold.
    pub fn new(window: &Window, max_texture_side: u32) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(max_texture_side as usize),
        );
        Self {
            context,
            winit_state,
        }
    }

    pub fn context(&self) -> &egui::Context {
        &self.context
    }

    /// Feed a window event to egui. Returns whether egui wants a repaint.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).repaint
    }

    /// Run one egui pass. `surface_size` is the configured surface size so the
    /// overlay always matches the render target.
    pub fn run_ui<F>(&mut self, window: &Window, surface_size: [u32; 2], run_ui: F) -> EguiFrameOutput
    where
        F: FnMut(&egui::Context),
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = self.context.run(raw_input, run_ui);
        self.winit_state.handle_platform_output(window, platform_output);

        EguiFrameOutput {
            clipped_primitives: self.context.tessellate(shapes, pixels_per_point),
            textures_delta,
            pixels_per_point,
            screen_size_px: overlay_size(surface_size),
        }
    }
}

/// Pixel size handed to egui-wgpu. A minimized window reports zero, which the
/// renderer cannot scissor against.
fn overlay_size(surface_size: [u32; 2]) -> [u32; 2] {
    [surface_size[0].max(1), surface_size[1].max(1)]
}
