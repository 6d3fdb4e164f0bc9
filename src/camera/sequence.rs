use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, DynamicImage};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Frame, FrameGrabber};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Replays still images from a directory in lexical order, looping forever.
pub struct ImageSequenceGrabber {
    dir: PathBuf,
    images: Vec<DynamicImage>,
    cursor: usize,
    resolution: Option<(u32, u32)>,
}

impl ImageSequenceGrabber {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            images: Vec::new(),
            cursor: 0,
            resolution: None,
        }
    }

    fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to read frames directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl FrameGrabber for ImageSequenceGrabber {
    fn open(&mut self, _device: u32) -> Result<()> {
        let paths = Self::list_images(&self.dir)?;
        if paths.is_empty() {
            bail!("no images found in {}", self.dir.display());
        }

        self.images = paths
            .iter()
            .map(|path| {
                image::open(path).with_context(|| format!("failed to decode {}", path.display()))
            })
            .collect::<Result<_>>()?;
        self.cursor = 0;
        Ok(())
    }

    fn set_resolution(&mut self, resolution: (u32, u32)) {
        self.resolution = Some(resolution);
    }

    fn grab(&mut self) -> Result<Option<Frame>> {
        if self.images.is_empty() {
            return Ok(None);
        }

        let image = &self.images[self.cursor];
        self.cursor = (self.cursor + 1) % self.images.len();

        let frame = match self.resolution {
            Some((width, height)) if (width, height) != (image.width(), image.height()) => {
                image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
            }
            _ => image.to_rgb8(),
        };
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.images.clear();
    }
}
