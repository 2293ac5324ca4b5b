// MODEL: camera and placed objects
pub mod camera;
pub mod scene;

pub use camera::Camera;
pub use scene::{SceneObject, SceneObjectStore, StoreEvent};
