use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Source directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Cannot allocate a {width}x{height} page canvas")]
    CanvasAllocation { width: u32, height: u32 },
    #[error("No images to lay out")]
    Empty,
}

impl SheetError {
    /// True for conditions the facade reports as a flagged placeholder
    /// instead of failing the run.
    pub fn is_soft(&self) -> bool {
        matches!(self, SheetError::MissingDirectory(_) | SheetError::Empty)
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
