use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat3, Vec3};
use tracing::debug;
use wgpu::*;

use super::gpu_init::GpuContext;
use crate::mesh::{Mesh, MeshBuffer, Vertex};
use crate::model::{Camera, SceneObjectStore};
use crate::ui::EguiFrameOutput;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const CLEAR_COLOR: Color = Color { r: 0.08, g: 0.09, b: 0.12, a: 1.0 };
const SELECTED_TINT: [f32; 4] = [1.0, 1.0, 0.55, 1.0];
const PLAIN_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            sun_dir: Vec3::new(-0.4, 0.7, -1.0).normalize().to_array(),
            sun_intensity: 0.8,
            ambient: 0.3,
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

/// Per-object data for instanced drawing
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub tint: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [VertexAttribute; 8] = [
        VertexAttribute { offset: 0, shader_location: 3, format: VertexFormat::Float32x4 },
        VertexAttribute { offset: 16, shader_location: 4, format: VertexFormat::Float32x4 },
        VertexAttribute { offset: 32, shader_location: 5, format: VertexFormat::Float32x4 },
        VertexAttribute { offset: 48, shader_location: 6, format: VertexFormat::Float32x4 },
        VertexAttribute { offset: 64, shader_location: 7, format: VertexFormat::Float32x3 },
        VertexAttribute { offset: 76, shader_location: 8, format: VertexFormat::Float32x3 },
        VertexAttribute { offset: 88, shader_location: 9, format: VertexFormat::Float32x3 },
        VertexAttribute { offset: 100, shader_location: 10, format: VertexFormat::Float32x4 },
    ];

    pub fn layout() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One instance per stored object, the selected one tinted.
pub fn build_instances(store: &SceneObjectStore, selected: Option<usize>) -> Vec<InstanceRaw> {
    store
        .iter()
        .enumerate()
        .map(|(index, object)| {
            let model = object.model_matrix();
            // Degenerate (zero) scale has no inverse; fall back to the plain basis.
            let linear = Mat3::from_mat4(model);
            let normal = if linear.determinant().abs() > f32::EPSILON {
                linear.inverse().transpose()
            } else {
                Mat3::IDENTITY
            };
            InstanceRaw {
                model: model.to_cols_array_2d(),
                normal: normal.to_cols_array_2d(),
                tint: if selected == Some(index) { SELECTED_TINT } else { PLAIN_TINT },
            }
        })
        .collect()
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub struct CameraResources {
    pub camera_buffer: Buffer,
    pub lighting_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub camera_bind_group: BindGroup,
}

pub fn create_camera_resources(device: &Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_entry = |binding, visibility| BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

pub fn create_object_pipeline(
    device: &Device,
    format: TextureFormat,
    bind_group_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("object_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/object.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("object_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("object_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout(), InstanceRaw::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            // Negative scales flip the winding, so both faces are drawn.
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// Draws the stored boxes and the egui overlay
pub struct SceneRenderer {
    pipeline: RenderPipeline,
    camera: CameraResources,
    mesh: MeshBuffer,
    instance_buffer: Buffer,
    instance_capacity: usize,
    instance_count: u32,
    depth_view: TextureView,
    egui_renderer: egui_wgpu::Renderer,
    dirty: Rc<Cell<bool>>,
    selected: Option<usize>,
}

impl SceneRenderer {
    /// Subscribes to `store` so edits made anywhere mark the instances stale.
    pub fn new(gpu: &GpuContext, mesh: &Mesh, store: &mut SceneObjectStore) -> Self {
        let device = gpu.device.as_ref();
        let camera = create_camera_resources(device);
        gpu.queue.write_buffer(
            &camera.lighting_buffer,
            0,
            bytemuck::bytes_of(&LightingUniform::default()),
        );
        let pipeline = create_object_pipeline(device, gpu.format, &camera.bind_group_layout);
        let (_, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);

        let dirty = Rc::new(Cell::new(true));
        let flag = dirty.clone();
        store.subscribe(move |event| {
            debug!("object {} changed, instances stale", event.index());
            flag.set(true);
        });

        let instance_capacity = store.len().max(4);
        let instance_buffer = create_instance_buffer(device, instance_capacity);

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            gpu.format,
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            pipeline,
            camera,
            mesh: mesh.upload(device),
            instance_buffer,
            instance_capacity,
            instance_count: 0,
            depth_view,
            egui_renderer,
            dirty,
            selected: None,
        }
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        let (_, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    pub fn update_camera(&self, queue: &Queue, camera: &Camera) {
        let uniform = CameraUniform {
            view_proj: camera.view_proj().to_cols_array_2d(),
        };
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Re-upload instances when the store changed or the selection moved.
    pub fn sync_instances(
        &mut self,
        device: &Device,
        queue: &Queue,
        store: &SceneObjectStore,
        selected: Option<usize>,
    ) {
        if !self.dirty.get() && self.selected == selected {
            return;
        }
        let instances = build_instances(store, selected);
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
            debug!("instance buffer grown to {}", self.instance_capacity);
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        self.instance_count = instances.len() as u32;
        self.selected = selected;
        self.dirty.set(false);
    }

    pub fn draw_frame(&mut self, gpu: &GpuContext, ui: &EguiFrameOutput) -> Result<(), SurfaceError> {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();
        let frame = gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: ui.screen_size_px,
            pixels_per_point: ui.pixels_per_point,
        };

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(CLEAR_COLOR), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.instance_count > 0 {
                rp.set_pipeline(&self.pipeline);
                rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);
                rp.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
                rp.set_vertex_buffer(1, self.instance_buffer.slice(..));
                rp.set_index_buffer(self.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..self.mesh.index_count, 0, 0..self.instance_count);
            }
        }

        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &ui.clipped_primitives,
            &screen_descriptor,
        );

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer.render(
                &mut egui_pass.forget_lifetime(),
                &ui.clipped_primitives,
                &screen_descriptor,
            );
        }

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_instance_buffer(device: &Device, capacity: usize) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as BufferAddress,
        usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 32);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 116);
    }

    #[test]
    fn instances_follow_store_and_tint_selection() {
        let mut store = SceneObjectStore::new();
        store.create_object();
        store.create_object();
        store.update_object(1, Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 1.0, 1.0));

        let instances = build_instances(&store, Some(1));
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].model, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(instances[0].tint, PLAIN_TINT);
        assert_eq!(instances[1].tint, SELECTED_TINT);
        assert_eq!(instances[1].model[3], [1.0, 2.0, 3.0, 1.0]);
        // Inverse-transpose halves the normal along the stretched axis.
        assert!((instances[1].normal[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_scale_does_not_produce_nan_normals() {
        let mut store = SceneObjectStore::new();
        store.create_object();
        store.update_object(0, Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0));
        let instances = build_instances(&store, None);
        assert!(instances[0].normal.iter().flatten().all(|v| v.is_finite()));
    }
}
