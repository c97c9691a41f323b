use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::{ArgAction, Parser, Subcommand};
use contact_sheet_core::config::{BorderShape, BorderStyle, LabelPosition, LabelStyle, LineStyle};
use contact_sheet_core::{
    DirectorySource, FileSink, LayoutConfig, OutputSink, SheetOutput,
    compose_sheets_with_progress, layout_source, to_json_layout, to_json_summary,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::DynamicImage;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "contact-sheet",
    about = "Lay a folder of images out on fixed-size pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render contact sheet pages to PNG
    Compose(SheetArgs),
    /// Layout-only export (no PNGs): probe sizes and write page assignments as JSON
    Layout(SheetArgs),
}

#[derive(Parser, Debug, Clone)]
struct SheetArgs {
    // Input/Output
    /// Input directory (not recursive)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name of written files (name.png, name_1.png, ... / name.json)
    #[arg(short, long, default_value = "sheet", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (keys present in the file override flags)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Page
    /// Page width in pixels
    #[arg(long, default_value_t = 4000, help_heading = "Page")]
    page_width: u32,
    /// Page aspect ratio W:H (height is derived)
    #[arg(long, default_value = "3:2", help_heading = "Page")]
    aspect_ratio: String,
    /// Items per row (columns for equal_width, rows for equal_height)
    #[arg(short = 'k', long, default_value_t = 3, help_heading = "Page")]
    per_row: u32,
    /// Margin around the page edge
    #[arg(long, default_value_t = 50, help_heading = "Page")]
    margin: u32,
    /// Padding between items
    #[arg(long, default_value_t = 30, help_heading = "Page")]
    padding: u32,
    /// Start position: margin | margin_plus_padding | margin_plus_padding_centered
    #[arg(long, default_value = "margin", help_heading = "Page")]
    start: String,
    /// Fill mode: fit_smaller | stretch | fit_long_side | crop_square | equal_width_stack | equal_height_stack
    #[arg(long, default_value = "fit_long_side", help_heading = "Page")]
    fill: String,

    // Style
    /// Background: light | dark | transparent
    #[arg(long, default_value = "light", help_heading = "Style")]
    background: String,
    /// Item border: none | rectangle | rounded:N
    #[arg(long, default_value = "rounded:10", help_heading = "Style")]
    item_border: String,
    /// Item border line: solid | dashed4 | dashed8 | dotted | dash_dot
    #[arg(long, default_value = "solid", help_heading = "Style")]
    item_line: String,
    /// Page border: none | rectangle | rounded:N
    #[arg(long, default_value = "rounded:30", help_heading = "Style")]
    page_border: String,
    /// Page border line: solid | dashed4 | dashed8 | dotted | dash_dot
    #[arg(long, default_value = "solid", help_heading = "Style")]
    page_line: String,
    /// Label position: above | inside_top | inside_middle | inside_bottom | below (labels off when unset)
    #[arg(long, help_heading = "Style")]
    label: Option<String>,
    /// Font file used for labels
    #[arg(long, help_heading = "Style")]
    label_font: Option<PathBuf>,
    /// Label color as hex RRGGBB or RRGGBBAA (defaults to the border color)
    #[arg(long, help_heading = "Style")]
    label_color: Option<String>,

    // Export
    /// Also write every placed item as its own PNG below this directory
    #[arg(long, help_heading = "Export")]
    export_dir: Option<PathBuf>,
    /// Put item exports in a fresh `blocks_<YYYYmmdd_HHMMSS>` folder inside --export-dir
    #[arg(long, default_value_t = false, help_heading = "Export")]
    stamp_exports: bool,
    /// Write a JSON run summary to this file
    #[arg(long, help_heading = "Export")]
    summary: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and render pages but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Compose(args) => run_compose(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => run_layout(args),
    }
}

fn run_compose(cli: &SheetArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = build_config(cli)?;
    if cli.print_config {
        return print_config(&cfg, &cli.print_config_format);
    }
    if cli.stamp_exports {
        let now = Local::now().naive_local();
        cfg.export_dir = cfg.export_dir.map(|dir| stamped_export_dir(&dir, now));
    }
    let source = directory_source(cli)?;

    let bar = if show_progress {
        use indicatif::{ProgressBar, ProgressStyle};
        let b = ProgressBar::new(0);
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} composing page {pos}/{len} [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(b)
    } else {
        None
    };
    let mut on_page = |done: usize, total: usize| {
        if let Some(b) = &bar {
            b.set_length(total as u64);
            b.set_position(done as u64);
        }
    };

    let mut file_sink = FileSink;
    let sink: Option<&mut dyn OutputSink> = if cli.dry_run || cfg.export_dir.is_none() {
        None
    } else {
        Some(&mut file_sink)
    };
    let out = compose_sheets_with_progress(&source, &cfg, sink, &mut on_page)?;
    if let Some(b) = &bar {
        b.finish_and_clear();
    }

    if let Some(reason) = out.placeholder {
        warn!(?reason, "no pages composed; writing placeholder");
    }
    info!(
        pages = out.page_count,
        cell = %out.cell_size(),
        items = out.item_count,
        skipped = out.skipped,
        "sheet composed"
    );

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        write_pages(&out, &cli.out_dir, &cli.name)?;
        if let Some(summary_path) = &cli.summary {
            let json = serde_json::to_string_pretty(&to_json_summary(&out))?;
            fs::write(summary_path, json)
                .with_context(|| format!("write {}", summary_path.display()))?;
            info!(?summary_path, "summary written");
        }
    }
    Ok(())
}

fn run_layout(cli: &SheetArgs) -> anyhow::Result<()> {
    let cfg = build_config(cli)?;
    if cli.print_config {
        return print_config(&cfg, &cli.print_config_format);
    }
    let source = directory_source(cli)?;
    let (layout, probed) = match layout_source(&source, &cfg) {
        Ok(v) => v,
        Err(e) if e.is_soft() => anyhow::bail!("nothing to lay out: {e}"),
        Err(e) => return Err(e.into()),
    };
    info!(
        pages = layout.pages.len(),
        cell = %layout.cell,
        skipped = probed.skipped,
        "{}",
        layout.stats().summary()
    );
    if cli.dry_run {
        return Ok(());
    }
    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    let keys: Vec<&str> = probed.items.iter().map(|it| it.key.as_str()).collect();
    let json_path = cli.out_dir.join(format!("{}.json", cli.name));
    let json = serde_json::to_string_pretty(&to_json_layout(&layout, &keys))?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, pages = layout.pages.len(), "layout written");
    Ok(())
}

fn write_pages(out: &SheetOutput, dir: &Path, name: &str) -> anyhow::Result<()> {
    let count = out.pages.len();
    let mut sink = FileSink;
    for i in 0..count {
        let Some(page) = out.pages.to_image(i) else {
            continue;
        };
        // Float pages go to disk as 8-bit PNG.
        let page = if out.pages.channels == 4 {
            DynamicImage::ImageRgba8(page.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(page.to_rgb8())
        };
        let png_path = if count == 1 {
            dir.join(format!("{name}.png"))
        } else {
            dir.join(format!("{name}_{}.png", i + 1))
        };
        sink.write(&page, &png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, page = i + 1, "wrote page");
    }
    Ok(())
}

fn print_config(cfg: &LayoutConfig, format: &str) -> anyhow::Result<()> {
    match format {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(())
}

fn parse_opt<T: FromStr>(what: &str, s: &str) -> anyhow::Result<T> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown {}: {}", what, s))
}

fn parse_color(s: &str) -> anyhow::Result<[u8; 4]> {
    let hex = s.trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        anyhow::bail!("label color must be RRGGBB or RRGGBBAA: {}", s);
    }
    let byte = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).with_context(|| format!("bad label color {s}"))
    };
    let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok([byte(0)?, byte(2)?, byte(4)?, alpha])
}

/// Per-run export folder so repeated runs don't overwrite each other.
fn stamped_export_dir(dir: &Path, at: NaiveDateTime) -> PathBuf {
    dir.join(format!("blocks_{}", at.format("%Y%m%d_%H%M%S")))
}

fn build_config(cli: &SheetArgs) -> anyhow::Result<LayoutConfig> {
    let label = match &cli.label {
        Some(pos) => Some(LabelStyle {
            position: parse_opt("label position", pos)?,
            color: cli.label_color.as_deref().map(parse_color).transpose()?,
            font: cli.label_font.clone(),
        }),
        None => None,
    };
    let cfg = LayoutConfig {
        page_width: cli.page_width,
        aspect_ratio: cli.aspect_ratio.clone(),
        per_row: cli.per_row,
        margin: cli.margin,
        padding: cli.padding,
        start: parse_opt("start position", &cli.start)?,
        fill: parse_opt("fill mode", &cli.fill)?,
        background: parse_opt("background", &cli.background)?,
        item_border: BorderStyle::new(
            parse_opt("border shape", &cli.item_border)?,
            parse_opt("line style", &cli.item_line)?,
        ),
        page_border: BorderStyle::new(
            parse_opt("border shape", &cli.page_border)?,
            parse_opt("line style", &cli.page_line)?,
        ),
        label,
        export_dir: cli.export_dir.clone(),
    };
    // Config file keys override flags
    let cfg = if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        y.into_layout_config(cfg)
    } else {
        cfg
    };
    cfg.validate()?;
    Ok(cfg)
}

fn directory_source(cli: &SheetArgs) -> anyhow::Result<DirectorySource> {
    let include = build_globset(&cli.include)?;
    let exclude = build_globset(&cli.exclude)?;
    let source = DirectorySource::new(&cli.input);
    if include.is_none() && exclude.is_none() {
        return Ok(source);
    }
    Ok(source.with_filter(move |p| !should_skip(p, include.as_ref(), exclude.as_ref())))
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    page_width: Option<u32>,
    aspect_ratio: Option<String>,
    per_row: Option<u32>,
    margin: Option<u32>,
    padding: Option<u32>,
    start: Option<String>,
    fill: Option<String>,
    background: Option<String>,
    item_border: Option<String>,
    item_line: Option<String>,
    page_border: Option<String>,
    page_line: Option<String>,
    label: Option<String>,
    label_font: Option<PathBuf>,
    label_color: Option<String>,
    export_dir: Option<PathBuf>,
}

impl YamlConfig {
    fn into_layout_config(self, mut cfg: LayoutConfig) -> LayoutConfig {
        if let Some(v) = self.page_width {
            cfg.page_width = v;
        }
        if let Some(v) = self.aspect_ratio {
            cfg.aspect_ratio = v;
        }
        if let Some(v) = self.per_row {
            cfg.per_row = v;
        }
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.start {
            cfg.start = v.parse().unwrap_or(cfg.start);
        }
        if let Some(v) = self.fill {
            cfg.fill = v.parse().unwrap_or(cfg.fill);
        }
        if let Some(v) = self.background {
            cfg.background = v.parse().unwrap_or(cfg.background);
        }
        if let Some(v) = self.item_border {
            cfg.item_border.shape = v.parse::<BorderShape>().unwrap_or(cfg.item_border.shape);
        }
        if let Some(v) = self.item_line {
            cfg.item_border.line = v.parse::<LineStyle>().unwrap_or(cfg.item_border.line);
        }
        if let Some(v) = self.page_border {
            cfg.page_border.shape = v.parse::<BorderShape>().unwrap_or(cfg.page_border.shape);
        }
        if let Some(v) = self.page_line {
            cfg.page_border.line = v.parse::<LineStyle>().unwrap_or(cfg.page_border.line);
        }
        if let Some(v) = self.label {
            match v.parse::<LabelPosition>() {
                Ok(position) => {
                    let style = cfg.label.get_or_insert(LabelStyle {
                        position,
                        color: None,
                        font: None,
                    });
                    style.position = position;
                }
                Err(()) if v.eq_ignore_ascii_case("none") => cfg.label = None,
                Err(()) => warn!(label = %v, "unknown label position in config; ignored"),
            }
        }
        if let Some(style) = cfg.label.as_mut() {
            if let Some(v) = self.label_font {
                style.font = Some(v);
            }
            if let Some(v) = self.label_color {
                match parse_color(&v) {
                    Ok(c) => style.color = Some(c),
                    Err(e) => warn!(error = %e, "label color in config ignored"),
                }
            }
        }
        if let Some(v) = self.export_dir {
            cfg.export_dir = Some(v);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_sheet_core::config::{Background, FillMode, StartPosition};

    #[test]
    fn yaml_keys_override_flags() {
        let y: YamlConfig = serde_yaml::from_str(
            "per_row: 5\nfill: equal_height\nitem_border: rounded(4)\npage_line: dotted\n",
        )
        .unwrap();
        let cfg = y.into_layout_config(LayoutConfig::default());
        assert_eq!(cfg.per_row, 5);
        assert_eq!(cfg.fill, FillMode::EqualHeightStack);
        assert_eq!(cfg.item_border.shape, BorderShape::Rounded(4));
        assert_eq!(cfg.page_border.line, LineStyle::Dotted);
        assert_eq!(cfg.page_width, 4000);
        assert_eq!(cfg.start, StartPosition::Margin);
        assert_eq!(cfg.background, Background::Light);
    }

    #[test]
    fn label_color_hex() {
        assert_eq!(parse_color("#ff8000").unwrap(), [255, 128, 0, 255]);
        assert_eq!(parse_color("00000080").unwrap(), [0, 0, 0, 128]);
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn stamped_exports_get_their_own_folder() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(
            stamped_export_dir(Path::new("exports"), at),
            PathBuf::from("exports/blocks_20240305_070809")
        );
    }

    #[test]
    fn globs_filter_paths() {
        let inc = build_globset(&["**/*.png".into()]).unwrap();
        let exc = build_globset(&["**/skip_*".into()]).unwrap();
        assert!(!should_skip(Path::new("dir/a.png"), inc.as_ref(), exc.as_ref()));
        assert!(should_skip(Path::new("dir/a.jpg"), inc.as_ref(), exc.as_ref()));
        assert!(should_skip(Path::new("dir/skip_a.png"), inc.as_ref(), exc.as_ref()));
    }
}
