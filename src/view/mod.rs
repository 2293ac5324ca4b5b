// VIEW: GPU setup and drawing
pub mod render;
pub mod gpu_init;

pub use render::{CameraResources, InstanceRaw, SceneRenderer};
pub use gpu_init::GpuContext;
