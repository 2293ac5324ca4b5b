// CONTROLLER: button input, camera stepping, property editing and the frame loop
pub mod input;
pub mod camera_controller;
pub mod property_editor;
pub mod frame_loop;

pub use input::{apply_edge, ButtonEdge, ButtonLatch, Direction, KeyPhase, KeyState, PanelAction};
pub use camera_controller::CameraController;
pub use property_editor::PropertyEditor;
pub use frame_loop::{FrameLoop, FrameReport, UiPump};
