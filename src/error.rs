use std::path::PathBuf;

/// Startup failures while reading the viewer's required assets
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("required asset missing: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode icon {}: {source}", path.display())]
    Icon {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to parse model {}: {source}", path.display())]
    ModelFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model {} is malformed: {reason}", path.display())]
    InvalidModel { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to decode sound {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("sound {} contains no samples", path.display())]
    Empty { path: PathBuf },
    #[error("failed to open audio output: {0}")]
    Output(String),
}

/// Which property entry failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformField {
    Position,
    Scale,
}

impl std::fmt::Display for TransformField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformField::Position => f.write_str("position"),
            TransformField::Scale => f.write_str("scale"),
        }
    }
}

/// Rejected text in the property editor's position/scale entries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformParseError {
    #[error("{field} needs exactly 3 values, got {count}")]
    WrongArity { field: TransformField, count: usize },
    #[error("{field} value {token:?} is not a number")]
    NotANumber { field: TransformField, token: String },
}

impl TransformParseError {
    pub fn field(&self) -> TransformField {
        match self {
            TransformParseError::WrongArity { field, .. } => *field,
            TransformParseError::NotANumber { field, .. } => *field,
        }
    }
}

/// Everything that can stop the viewer from starting or running
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
