use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::raster::RasterImage;
use crate::config::AssetConfig;

/// Outcome of the logo lookup. The renderer prints a text label for the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoAsset {
    Image(RasterImage),
    Placeholder,
}

/// Ordered list of places a logo file may live. The first existing regular file wins.
#[derive(Debug, Clone, Default)]
pub struct LogoResolver {
    candidates: Vec<PathBuf>,
}

impl LogoResolver {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Never finds a logo. Useful for callers that want the placeholder explicitly.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Standard search order for a deployment.
    pub fn from_config(config: &AssetConfig) -> Self {
        let mut candidates = Vec::new();
        if let Some(explicit) = &config.logo_path {
            candidates.push(explicit.clone());
        }
        candidates.push(config.content_root.join("resources").join("logo.png"));

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.push(exe_dir.join("resources").join("logo.png"));
            candidates.push(exe_dir.join("resources").join("logo_shields.png"));
        }

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join("resources").join("logo.png"));
            candidates.push(cwd.join("resources").join("logo_shields.png"));
        }

        Self::new(candidates)
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn resolve(&self) -> Option<&Path> {
        for candidate in &self.candidates {
            debug!(path = %candidate.display(), "checking logo candidate");
            if candidate.is_file() {
                info!(path = %candidate.display(), "logo found");
                return Some(candidate.as_path());
            }
        }
        None
    }

    /// Loads and decodes the logo. Missing or broken files degrade to the placeholder.
    pub fn load(&self) -> LogoAsset {
        let Some(path) = self.resolve() else {
            warn!(
                candidates = self.candidates.len(),
                "no logo file found, using text placeholder"
            );
            return LogoAsset::Placeholder;
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to read logo file");
                return LogoAsset::Placeholder;
            }
        };

        match RasterImage::decode(&bytes) {
            Ok(image) => LogoAsset::Image(image),
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to decode logo image");
                LogoAsset::Placeholder
            }
        }
    }
}
