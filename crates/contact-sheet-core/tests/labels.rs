use std::fs;
use std::path::PathBuf;

use contact_sheet_core::error::SheetError;
use contact_sheet_core::label::LabelRenderer;
use contact_sheet_core::prelude::*;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf")
}

fn style(position: LabelPosition, color: Option<[u8; 4]>) -> LabelStyle {
    LabelStyle {
        position,
        color,
        font: Some(font_path()),
    }
}

fn renderer(position: LabelPosition) -> LabelRenderer {
    LabelRenderer::load(&style(position, None)).unwrap()
}

/// Bounding box `(x0, y0, x1, y1)` of every pixel that is not `bg`.
fn ink_bounds(img: &RgbaImage, bg: Rgba<u8>) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if *p == bg {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

// 100x100 cell at (50, 50) gives 12 px text.
const CELL: Rect = Rect {
    x: 50,
    y: 50,
    w: 100,
    h: 100,
};

fn draw_at(position: LabelPosition) -> (u32, u32, u32, u32) {
    let mut canvas = RgbaImage::from_pixel(200, 200, PAPER);
    renderer(position).draw(&mut canvas, CELL, "HH", INK);
    ink_bounds(&canvas, PAPER).unwrap()
}

#[test]
fn anchors_place_text_in_the_right_band() {
    let cases = [
        (LabelPosition::Above, 30, 50),
        (LabelPosition::InsideTop, 50, 70),
        (LabelPosition::InsideMiddle, 90, 110),
        (LabelPosition::InsideBottom, 130, 150),
        (LabelPosition::Below, 150, 170),
    ];
    for (position, top, bottom) in cases {
        let (x0, y0, x1, y1) = draw_at(position);
        assert!(y0 >= top && y1 < bottom, "{position:?}: rows {y0}..={y1}");
        // horizontally centered on the cell
        let mid = (x0 + x1) / 2;
        assert!((96..=104).contains(&mid), "{position:?}: mid {mid}");
        assert!(x0 > CELL.x && x1 < CELL.x + CELL.w);
    }
}

#[test]
fn measure_scales_with_text() {
    let r = renderer(LabelPosition::InsideBottom);
    let (w2, h) = r.measure("HH", 12.0);
    let (w4, _) = r.measure("HHHH", 12.0);
    assert!(w2 > 0.0);
    assert!((w4 - 2.0 * w2).abs() < 0.01);
    assert!((h - 12.0).abs() < 0.5, "height {h}");
    assert_eq!(r.measure("", 12.0).0, 0.0);
}

#[test]
fn configured_color_wins_over_ink() {
    let r = LabelRenderer::load(&style(LabelPosition::InsideTop, Some([255, 0, 0, 255]))).unwrap();
    let mut canvas = RgbaImage::from_pixel(200, 200, PAPER);
    r.draw(&mut canvas, CELL, "HH", INK);
    let mostly_red = canvas.pixels().any(|p| p[0] == 255 && p[1] < 128);
    assert!(mostly_red);
    assert!(canvas.pixels().all(|p| p[1] == p[2] && p[0] == 255));
}

#[test]
fn labels_blend_onto_transparent_pages() {
    let clear = Rgba([0, 0, 0, 0]);
    let mut canvas = RgbaImage::from_pixel(200, 200, clear);
    renderer(LabelPosition::Below).draw(&mut canvas, CELL, "HH", PAPER);
    let inked: Vec<_> = canvas.pixels().filter(|p| p[3] > 0).collect();
    assert!(!inked.is_empty());
    assert!(inked.iter().any(|p| p[3] >= 128));
    assert!(inked.iter().all(|p| p[0] == p[3] && p[1] == p[3]));
}

#[test]
fn text_off_the_canvas_is_clipped() {
    let mut canvas = RgbaImage::from_pixel(60, 60, PAPER);
    let cell = Rect::new(0, 0, 60, 60);
    renderer(LabelPosition::Above).draw(&mut canvas, cell, "HH", INK);
    assert!(canvas.pixels().all(|p| *p == PAPER));
}

#[test]
fn broken_fonts_are_rejected() {
    let junk = std::env::temp_dir().join(format!("contact_sheet_font_{}.ttf", std::process::id()));
    fs::write(&junk, b"not a font").unwrap();
    let err = LabelRenderer::load(&LabelStyle {
        position: LabelPosition::InsideBottom,
        color: None,
        font: Some(junk.clone()),
    });
    assert!(matches!(err, Err(SheetError::Font(_))));
    fs::remove_file(&junk).ok();

    let none = LabelRenderer::load(&LabelStyle {
        position: LabelPosition::InsideBottom,
        color: None,
        font: None,
    });
    assert!(matches!(none, Err(SheetError::Font(_))));
}

#[test]
fn composed_pages_carry_labels() {
    let mut src = MemorySource::new();
    src.push(
        "red.png",
        DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 0, 0]))),
    );
    let base = LayoutConfig::builder()
        .page_width(200)
        .aspect_ratio("1:1")
        .per_row(2)
        .margin(10)
        .padding(10)
        .fill(FillMode::Stretch)
        .no_borders()
        .build();
    let labelled = LayoutConfig {
        label: Some(style(LabelPosition::InsideBottom, None)),
        ..base.clone()
    };

    let dark_in_band = |cfg: &LayoutConfig| {
        let out = compose_sheets(&src, cfg, None).unwrap();
        let page = out.pages.to_image(0).unwrap().to_rgb8();
        // the single cell is centered: x in 57..142, bottom band above y = 95
        (57..142).any(|x| (75..95).any(|y| page.get_pixel(x, y)[0] < 128))
    };
    assert!(dark_in_band(&labelled));
    assert!(!dark_in_band(&base));
}
