use image::Rgba;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::geometry::page_height_for;

/// Where the first row/column starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    /// First cell touches the margin; gaps only between cells.
    Margin,
    /// One padding gap before the first and after the last cell.
    MarginPlusPadding,
    /// As `MarginPlusPadding`, plus the block is centered vertically on each page.
    MarginPlusPaddingCentered,
}

impl StartPosition {
    /// Number of padding gaps occupied by `n` cells laid side by side.
    pub fn gaps(self, n: u32) -> i64 {
        match self {
            StartPosition::Margin => n as i64 - 1,
            _ => n as i64 + 1,
        }
    }
    /// Offset of the first cell from the margin.
    pub fn lead(self, padding: u32) -> u32 {
        match self {
            StartPosition::Margin => 0,
            _ => padding,
        }
    }
    pub fn centers_vertically(self) -> bool {
        matches!(self, StartPosition::MarginPlusPaddingCentered)
    }
}

impl FromStr for StartPosition {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "margin" => Ok(Self::Margin),
            "margin_plus_padding" | "margin+padding" | "padding" => Ok(Self::MarginPlusPadding),
            "margin_plus_padding_centered" | "margin+padding+center" | "centered" => {
                Ok(Self::MarginPlusPaddingCentered)
            }
            _ => Err(()),
        }
    }
}

/// How items are sized and how their pixels are mapped into their cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Keep aspect, shrink to fit the cell, never enlarge.
    FitSmaller,
    /// Ignore aspect, fill the cell exactly.
    Stretch,
    /// Keep aspect, scale the long side to the cell (up or down).
    FitLongSide,
    /// Crop a centered square, then fill the cell.
    CropSquare,
    /// Columns of shared width; each item's height follows its aspect.
    EqualWidthStack,
    /// Rows of shared height; each item's width follows its aspect.
    EqualHeightStack,
}

impl FromStr for FillMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fit_smaller" | "smaller" => Ok(Self::FitSmaller),
            "stretch" => Ok(Self::Stretch),
            "fit_long_side" | "long_side" => Ok(Self::FitLongSide),
            "crop_square" | "crop" => Ok(Self::CropSquare),
            "equal_width_stack" | "equal_width" | "columns" => Ok(Self::EqualWidthStack),
            "equal_height_stack" | "equal_height" | "rows" => Ok(Self::EqualHeightStack),
            _ => Err(()),
        }
    }
}

/// Page background.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Light,
    Dark,
    /// RGBA output; everything but content and strokes has alpha 0.
    Transparent,
}

impl Background {
    pub fn has_alpha(self) -> bool {
        matches!(self, Background::Transparent)
    }
    pub fn fill(self) -> Rgba<u8> {
        match self {
            Background::Light => Rgba([255, 255, 255, 255]),
            Background::Dark => Rgba([0, 0, 0, 255]),
            Background::Transparent => Rgba([0, 0, 0, 0]),
        }
    }
    /// Border and default label color for this background.
    pub fn ink(self) -> Rgba<u8> {
        match self {
            Background::Dark => Rgba([255, 255, 255, 255]),
            _ => Rgba([0, 0, 0, 255]),
        }
    }
    pub fn channels(self) -> u8 {
        if self.has_alpha() { 4 } else { 3 }
    }
}

impl FromStr for Background {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" | "white" => Ok(Self::Light),
            "dark" | "black" => Ok(Self::Dark),
            "transparent" | "alpha" => Ok(Self::Transparent),
            _ => Err(()),
        }
    }
}

/// Outline shape of a border.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BorderShape {
    None,
    Rectangle,
    /// Rounded corners with the given radius in pixels.
    Rounded(u32),
}

impl FromStr for BorderShape {
    type Err = ();
    /// Accepts `none`, `rectangle`/`rect`, `rounded` (radius 10), `rounded:N`, `rounded(N)` and `roundedN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        match s.as_str() {
            "none" => return Ok(Self::None),
            "rectangle" | "rect" => return Ok(Self::Rectangle),
            "rounded" => return Ok(Self::Rounded(10)),
            _ => {}
        }
        let radius = s.strip_prefix("rounded").ok_or(())?;
        let radius = radius.trim_matches([':', '=', ' ', '(', ')']);
        radius.parse().map(Self::Rounded).map_err(|_| ())
    }
}

/// Dash style of a border's straight edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    /// 4 on, 4 off.
    Dashed4,
    /// 8 on, 8 off.
    Dashed8,
    /// 1 on, 2 off.
    Dotted,
    /// 8 on, 4 off, 2 on, 4 off.
    DashDot,
}

impl LineStyle {
    pub fn pattern(self) -> Option<&'static [f32]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed4 => Some(&[4.0, 4.0]),
            LineStyle::Dashed8 => Some(&[8.0, 8.0]),
            LineStyle::Dotted => Some(&[1.0, 2.0]),
            LineStyle::DashDot => Some(&[8.0, 4.0, 2.0, 4.0]),
        }
    }
}

impl FromStr for LineStyle {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "solid" => Ok(Self::Solid),
            "dashed" | "dashed4" => Ok(Self::Dashed4),
            "dashed8" => Ok(Self::Dashed8),
            "dotted" => Ok(Self::Dotted),
            "dash_dot" | "dashdot" => Ok(Self::DashDot),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BorderStyle {
    pub shape: BorderShape,
    #[serde(default)]
    pub line: LineStyle,
}

impl BorderStyle {
    pub const NONE: BorderStyle = BorderStyle {
        shape: BorderShape::None,
        line: LineStyle::Solid,
    };

    pub fn new(shape: BorderShape, line: LineStyle) -> Self {
        Self { shape, line }
    }
    pub fn is_visible(&self) -> bool {
        !matches!(self.shape, BorderShape::None)
    }
}

/// Vertical anchor of a label relative to its cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    Above,
    InsideTop,
    InsideMiddle,
    InsideBottom,
    Below,
}

impl FromStr for LabelPosition {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "inside_top" | "top" => Ok(Self::InsideTop),
            "inside_middle" | "middle" | "center" => Ok(Self::InsideMiddle),
            "inside_bottom" | "bottom" => Ok(Self::InsideBottom),
            "below" => Ok(Self::Below),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelStyle {
    pub position: LabelPosition,
    /// RGBA; `None` uses the background's ink color.
    #[serde(default)]
    pub color: Option<[u8; 4]>,
    /// TrueType/OpenType font file used to render labels.
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Page width in pixels.
    pub page_width: u32,
    /// Page aspect ratio as `"W:H"`; the height is derived from it.
    pub aspect_ratio: String,
    /// Items per row (grid, equal-width columns) or rows per page (equal-height).
    pub per_row: u32,
    /// Pixels around the page edge.
    pub margin: u32,
    /// Pixels between items.
    pub padding: u32,

    #[serde(default = "default_start")]
    pub start: StartPosition,
    #[serde(default = "default_fill")]
    pub fill: FillMode,
    #[serde(default = "default_background")]
    pub background: Background,
    #[serde(default = "default_item_border")]
    pub item_border: BorderStyle,
    #[serde(default = "default_page_border")]
    pub page_border: BorderStyle,

    /// Per-item labels; `None` disables them.
    #[serde(default)]
    pub label: Option<LabelStyle>,
    /// When set, every placed item is also written as its own PNG below this directory.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 4000,
            aspect_ratio: "3:2".into(),
            per_row: 3,
            margin: 50,
            padding: 30,
            start: default_start(),
            fill: default_fill(),
            background: default_background(),
            item_border: default_item_border(),
            page_border: default_page_border(),
            label: None,
            export_dir: None,
        }
    }
}

impl LayoutConfig {
    /// Page width and the height derived from `aspect_ratio`.
    pub fn page_size(&self) -> (u32, u32) {
        (self.page_width, page_height_for(self.page_width, &self.aspect_ratio))
    }

    /// Validates the configuration parameters.
    ///
    /// Margin/padding combinations that squeeze the usable area are not errors:
    /// the packer clamps them. Only values that make a page meaningless are rejected.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SheetError;

        if self.page_width == 0 {
            return Err(SheetError::InvalidInput("page_width must be positive".into()));
        }
        if self.per_row == 0 {
            return Err(SheetError::InvalidInput("per_row must be at least 1".into()));
        }
        let (w, h) = self.page_size();
        if (w as u64) * (h as u64) > u32::MAX as u64 {
            return Err(SheetError::CanvasAllocation { width: w, height: h });
        }
        Ok(())
    }
}

fn default_start() -> StartPosition {
    StartPosition::Margin
}
fn default_fill() -> FillMode {
    FillMode::FitLongSide
}
fn default_background() -> Background {
    Background::Light
}
fn default_item_border() -> BorderStyle {
    BorderStyle::new(BorderShape::Rounded(10), LineStyle::Solid)
}
fn default_page_border() -> BorderStyle {
    BorderStyle::new(BorderShape::Rounded(30), LineStyle::Solid)
}

/// Builder for `LayoutConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct LayoutConfigBuilder {
    cfg: LayoutConfig,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: LayoutConfig::default(),
        }
    }
    pub fn page_width(mut self, v: u32) -> Self {
        self.cfg.page_width = v;
        self
    }
    pub fn aspect_ratio(mut self, v: impl Into<String>) -> Self {
        self.cfg.aspect_ratio = v.into();
        self
    }
    pub fn per_row(mut self, v: u32) -> Self {
        self.cfg.per_row = v;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn start(mut self, v: StartPosition) -> Self {
        self.cfg.start = v;
        self
    }
    pub fn fill(mut self, v: FillMode) -> Self {
        self.cfg.fill = v;
        self
    }
    pub fn background(mut self, v: Background) -> Self {
        self.cfg.background = v;
        self
    }
    pub fn item_border(mut self, v: BorderStyle) -> Self {
        self.cfg.item_border = v;
        self
    }
    pub fn page_border(mut self, v: BorderStyle) -> Self {
        self.cfg.page_border = v;
        self
    }
    pub fn no_borders(mut self) -> Self {
        self.cfg.item_border = BorderStyle::NONE;
        self.cfg.page_border = BorderStyle::NONE;
        self
    }
    pub fn label(mut self, v: Option<LabelStyle>) -> Self {
        self.cfg.label = v;
        self
    }
    pub fn export_dir(mut self, v: Option<PathBuf>) -> Self {
        self.cfg.export_dir = v;
        self
    }
    pub fn build(self) -> LayoutConfig {
        self.cfg
    }
}

impl LayoutConfig {
    /// Create a fluent builder for `LayoutConfig`.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::new()
    }
}
