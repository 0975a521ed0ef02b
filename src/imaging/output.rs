use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat};
use tracing::{info, warn};

use crate::error::PortraitResult;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Makes a name safe to embed in a file name: spaces become underscores,
/// path separators and shell-hostile characters are dropped.
pub fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .filter_map(|ch| match ch {
            ' ' => Some('_'),
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => None,
            ch if ch.is_control() => None,
            ch => Some(ch),
        })
        .collect()
}

/// Builds `<character>_<game>[_<n>][_<timestamp>].png` file names.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    dir: PathBuf,
    stem: String,
    timestamp: Option<String>,
}

impl OutputNamer {
    pub fn new(dir: &Path, character: &str, game: &str, stamped_at: Option<DateTime<Local>>) -> Self {
        OutputNamer {
            dir: dir.to_path_buf(),
            stem: format!("{}_{}", sanitize(character), sanitize(game)),
            timestamp: stamped_at.map(|at| at.format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// `index` is 1-based; `None` leaves the counter out, for single images.
    pub fn path_for(&self, index: Option<usize>) -> PathBuf {
        let mut name = self.stem.clone();
        if let Some(index) = index {
            name.push_str(&format!("_{index}"));
        }
        if let Some(timestamp) = &self.timestamp {
            name.push('_');
            name.push_str(timestamp);
        }
        name.push_str(".png");
        self.dir.join(name)
    }
}

fn remove_written(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = std::fs::remove_file(path) {
            warn!("Failed to remove partial output {}: {}", path.display(), err);
        }
    }
}

/// Writes every image as PNG. If any write fails, the files already written
/// for this batch are removed again.
pub fn save_images(namer: &OutputNamer, images: &[DynamicImage]) -> PortraitResult<Vec<PathBuf>> {
    std::fs::create_dir_all(&namer.dir)?;

    let numbered = images.len() > 1;
    let mut written = Vec::with_capacity(images.len());
    for (position, image) in images.iter().enumerate() {
        let path = namer.path_for(numbered.then_some(position + 1));
        let saved = image.save_with_format(&path, ImageFormat::Png);
        if let Err(err) = saved {
            if path.is_file() {
                written.push(path);
            }
            remove_written(&written);
            return Err(io::Error::other(err).into());
        }
        info!("Saved portrait to {}", path.display());
        written.push(path);
    }
    Ok(written)
}
