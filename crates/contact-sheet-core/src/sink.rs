use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Persists rendered rasters.
pub trait OutputSink {
    fn write(&mut self, image: &DynamicImage, path: &Path) -> Result<()>;
}

/// Writes images to disk; the format follows the path's extension.
/// Parent directories are created as needed (existing ones are fine).
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSink;

impl OutputSink for FileSink {
    fn write(&mut self, image: &DynamicImage, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        image.save(path)?;
        Ok(())
    }
}

/// Keeps every written image in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub written: Vec<(PathBuf, DynamicImage)>,
}

impl OutputSink for MemorySink {
    fn write(&mut self, image: &DynamicImage, path: &Path) -> Result<()> {
        self.written.push((path.to_path_buf(), image.clone()));
        Ok(())
    }
}
