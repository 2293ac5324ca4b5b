pub mod logging;
pub mod config;
pub mod error;
pub mod audio;
pub mod assets;
pub mod mesh;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;
