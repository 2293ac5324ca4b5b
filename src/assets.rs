use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::Deserialize;
use tracing::{error, info};

use crate::controller::input::{panel_actions, PanelAction};
use crate::error::AssetError;
use crate::mesh::{Mesh, Vertex};

pub const SOUND_FILE: &str = "move.wav";
pub const MODEL_FILE: &str = "models/box.json";
pub const ICON_DIR: &str = "icons";

/// Locations of every file the viewer refuses to start without
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPaths {
    pub sound: PathBuf,
    pub model: PathBuf,
    pub icons: Vec<(PanelAction, PathBuf)>,
}

impl AssetPaths {
    pub fn new(asset_dir: &Path) -> Self {
        let icons = panel_actions()
            .map(|action| {
                let path = asset_dir
                    .join(ICON_DIR)
                    .join(format!("{}.png", action.icon_name()));
                (action, path)
            })
            .collect();
        Self {
            sound: asset_dir.join(SOUND_FILE),
            model: asset_dir.join(MODEL_FILE),
            icons,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Path> {
        [self.sound.as_path(), self.model.as_path()]
            .into_iter()
            .chain(self.icons.iter().map(|(_, p)| p.as_path()))
    }

    /// Fails on the first missing file after logging every missing one.
    pub fn verify(&self) -> Result<(), AssetError> {
        let missing: Vec<&Path> = self.all().filter(|p| !p.is_file()).collect();
        for path in &missing {
            error!("required asset missing: {}", path.display());
        }
        match missing.first() {
            Some(path) => Err(AssetError::Missing {
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    name: Option<String>,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct ModelVertex {
    position: [f32; 3],
    normal: [f32; 3],
    #[serde(default = "default_color")]
    color: [f32; 4],
}

fn default_color() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

pub fn parse_model(path: &Path, json: &str) -> Result<Mesh, AssetError> {
    let file: ModelFile = serde_json::from_str(json).map_err(|source| AssetError::ModelFormat {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = Mesh {
        vertices: file
            .vertices
            .iter()
            .map(|v| Vertex {
                pos: v.position,
                normal: v.normal,
                color: v.color,
            })
            .collect(),
        indices: file.indices,
    };
    mesh.validate().map_err(|reason| AssetError::InvalidModel {
        path: path.to_path_buf(),
        reason,
    })?;
    info!(
        "model {} loaded from {}: {} vertices, {} triangles",
        file.name.as_deref().unwrap_or("<unnamed>"),
        path.display(),
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

pub fn load_model(path: &Path) -> Result<Mesh, AssetError> {
    let json = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_model(path, &json)
}

/// Decode an icon and fit it into a `size` x `size` square.
pub fn load_icon(path: &Path, size: u32) -> Result<egui::ColorImage, AssetError> {
    let image = image::open(path).map_err(|source| AssetError::Icon {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image.resize_exact(size, size, FilterType::Lanczos3).to_rgba8();
    let dims = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(dims, rgba.as_raw()))
}

/// Geometry and icon pixels, decoded before any window exists
pub struct LoadedAssets {
    pub mesh: Mesh,
    pub icons: Vec<(PanelAction, egui::ColorImage)>,
}

impl LoadedAssets {
    pub fn load(paths: &AssetPaths, icon_size: u32) -> Result<Self, AssetError> {
        paths.verify()?;
        let mesh = load_model(&paths.model)?;
        let icons = paths
            .icons
            .iter()
            .map(|(action, path)| Ok((*action, load_icon(path, icon_size)?)))
            .collect::<Result<Vec<_>, AssetError>>()?;
        info!("{} icons loaded", icons.len());
        Ok(Self { mesh, icons })
    }
}
