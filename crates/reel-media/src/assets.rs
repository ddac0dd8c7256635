//! Fixed artwork, music and fonts used by the renderers.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default asset directory in the production container.
pub const DEFAULT_ASSETS_DIR: &str = "/app/assets";

/// Development fallbacks checked when the production directory is absent.
const DEV_ASSETS_DIRS: &[&str] = &["./assets", "../assets", "../../assets"];

pub const BACKGROUND_MUSIC: &str = "default-bg-music.mp3";
pub const TOP_BANNER: &str = "shorts-top-banner.png";
pub const BOTTOM_BANNER: &str = "shorts-bottom-banner.png";
pub const SIDE_BANNER: &str = "right-adv-banner.jpeg";
pub const LOGO: &str = "transparent.png";
pub const CAPTION_FONT: &str = "caption-font.ttf";

/// Resolved locations of every asset.
///
/// Optional artwork is skipped with a warning when missing; music and the
/// caption font are required by the modes that use them.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    dir: PathBuf,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new(resolve_assets_dir())
    }
}

impl AssetCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an asset if the file exists.
    pub fn optional(&self, name: &str) -> Option<PathBuf> {
        let path = self.dir.join(name);
        if path.is_file() {
            Some(path)
        } else {
            warn!(path = %path.display(), "Asset not found, skipping");
            None
        }
    }

    /// Path of an asset that must exist.
    pub fn required(&self, name: &str) -> MediaResult<PathBuf> {
        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(MediaError::AssetMissing(path))
        }
    }

    pub fn background_music(&self) -> MediaResult<PathBuf> {
        self.required(BACKGROUND_MUSIC)
    }

    pub fn caption_font(&self) -> MediaResult<PathBuf> {
        self.required(CAPTION_FONT)
    }

    pub fn top_banner(&self) -> Option<PathBuf> {
        self.optional(TOP_BANNER)
    }

    pub fn bottom_banner(&self) -> Option<PathBuf> {
        self.optional(BOTTOM_BANNER)
    }

    pub fn side_banner(&self) -> Option<PathBuf> {
        self.optional(SIDE_BANNER)
    }

    pub fn logo(&self) -> Option<PathBuf> {
        self.optional(LOGO)
    }

    /// Names of required assets that are missing.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [BACKGROUND_MUSIC, CAPTION_FONT]
            .into_iter()
            .filter(|name| !self.dir.join(name).is_file())
            .collect()
    }
}

fn resolve_assets_dir() -> PathBuf {
    if Path::new(DEFAULT_ASSETS_DIR).is_dir() {
        return PathBuf::from(DEFAULT_ASSETS_DIR);
    }

    for dir in DEV_ASSETS_DIRS {
        if Path::new(dir).is_dir() {
            debug!("Using development assets directory: {}", dir);
            return PathBuf::from(dir);
        }
    }

    PathBuf::from(DEFAULT_ASSETS_DIR)
}
