//! Where items come from: listing, header-only size probing and decoding.

use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{Result, SheetError};

/// Extensions (lowercase) accepted when listing a directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp"];

/// A listed source image. `key` is its file name and doubles as the label text source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub index: usize,
    pub key: String,
    pub path: PathBuf,
}

impl Item {
    /// File name without extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.key)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.key)
    }
}

/// Supplies items to the layout pipeline.
///
/// Per-item failures are returned as errors for that item only; callers skip
/// the item and carry on.
pub trait ImageSource {
    /// Eligible items in a stable order.
    fn list(&self) -> Result<Vec<Item>>;
    /// Intrinsic `(width, height)` without decoding pixel data where possible.
    fn probe_size(&self, item: &Item) -> Result<(u32, u32)>;
    fn decode(&self, item: &Item) -> Result<DynamicImage>;
}

pub fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str())
    )
}

type PathFilter = Box<dyn Fn(&Path) -> bool>;

/// Images directly inside one directory (not recursive), sorted by file name.
pub struct DirectorySource {
    dir: PathBuf,
    filter: Option<PathFilter>,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filter: None,
        }
    }

    /// Keep only paths for which `filter` returns true (applied after the extension check).
    pub fn with_filter(mut self, filter: impl Fn(&Path) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageSource for DirectorySource {
    fn list(&self) -> Result<Vec<Item>> {
        if !self.dir.is_dir() {
            return Err(SheetError::MissingDirectory(self.dir.clone()));
        }
        let mut items = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "skip unreadable directory entry");
                    continue;
                }
            };
            let p = entry.path();
            if !entry.file_type().is_file() || !is_image(p) {
                continue;
            }
            if let Some(f) = &self.filter {
                if !f(p) {
                    continue;
                }
            }
            items.push(Item {
                index: items.len(),
                key: entry.file_name().to_string_lossy().into_owned(),
                path: p.to_path_buf(),
            });
        }
        Ok(items)
    }

    fn probe_size(&self, item: &Item) -> Result<(u32, u32)> {
        Ok(ImageReader::open(&item.path)?
            .with_guessed_format()?
            .into_dimensions()?)
    }

    fn decode(&self, item: &Item) -> Result<DynamicImage> {
        Ok(ImageReader::open(&item.path)?
            .with_guessed_format()?
            .decode()?)
    }
}

/// In-memory images keyed by name. A `None` image simulates a corrupt file.
#[derive(Default)]
pub struct MemorySource {
    images: Vec<(String, Option<DynamicImage>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, image: DynamicImage) -> &mut Self {
        self.images.push((key.into(), Some(image)));
        self
    }

    /// Adds an item that lists fine but fails to probe and decode.
    pub fn push_corrupt(&mut self, key: impl Into<String>) -> &mut Self {
        self.images.push((key.into(), None));
        self
    }

    fn get(&self, item: &Item) -> Result<&DynamicImage> {
        self.images
            .get(item.index)
            .and_then(|(_, img)| img.as_ref())
            .ok_or_else(|| SheetError::InvalidInput(format!("cannot decode {}", item.key)))
    }
}

impl ImageSource for MemorySource {
    fn list(&self) -> Result<Vec<Item>> {
        Ok(self
            .images
            .iter()
            .enumerate()
            .map(|(index, (key, _))| Item {
                index,
                key: key.clone(),
                path: PathBuf::from(key),
            })
            .collect())
    }

    fn probe_size(&self, item: &Item) -> Result<(u32, u32)> {
        self.get(item).map(|img| (img.width(), img.height()))
    }

    fn decode(&self, item: &Item) -> Result<DynamicImage> {
        self.get(item).cloned()
    }
}
