pub mod egui_host;
pub mod panels;

pub use egui_host::{EguiFrameOutput, EguiHost};
pub use panels::ViewerUi;
