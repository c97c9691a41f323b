//! Core library for contact sheets: lay a folder of images out on fixed-size pages.
//!
//! - Sizing policies: uniform square grid (fit, stretch, crop) and equal-width / equal-height stacks
//! - Pipeline: `compose_sheets` reads an [`ImageSource`] and returns the rendered page batch
//! - Layout-only: `pack_layout` works on sizes alone; the data model is serde-serializable
//!
//! Quick example:
//! ```ignore
//! use contact_sheet_core::{DirectorySource, LayoutConfig, compose_sheets};
//! # fn main() -> anyhow::Result<()> {
//! let cfg = LayoutConfig::builder().page_width(2000).per_row(4).build();
//! let out = compose_sheets(&DirectorySource::new("photos"), &cfg, None)?;
//! println!("pages: {} cell: {}", out.page_count, out.cell_size());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod label;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod stroke;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use sink::*;
pub use source::*;

/// Convenience prelude for common types and functions.
/// Importing `contact_sheet_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        Background, BorderShape, BorderStyle, FillMode, LabelPosition, LabelStyle, LayoutConfig,
        LayoutConfigBuilder, LineStyle, StartPosition,
    };
    pub use crate::model::{CellSize, Layout, LayoutItem, PageAssignment, Placement, Rect};
    pub use crate::pipeline::{PageBatch, Placeholder, SheetOutput};
    pub use crate::sink::{FileSink, MemorySink, OutputSink};
    pub use crate::source::{DirectorySource, ImageSource, MemorySource};
    pub use crate::{
        compose_sheets, compose_sheets_with_progress, layout_source, pack_layout, to_json_layout,
    };
}
