use contact_sheet_core::config::{FillMode, LayoutConfig, StartPosition};
use contact_sheet_core::model::{CellSize, Layout, LayoutItem};
use contact_sheet_core::{LayoutPlan, SheetError, pack_layout};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn items(sizes: &[(u32, u32)]) -> Vec<LayoutItem<String>> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| LayoutItem::new(format!("img_{i}"), w, h))
        .collect()
}

fn square_page(k: u32, start: StartPosition) -> LayoutConfig {
    LayoutConfig::builder()
        .page_width(1000)
        .aspect_ratio("1:1")
        .per_row(k)
        .margin(0)
        .padding(10)
        .start(start)
        .fill(FillMode::Stretch)
        .no_borders()
        .build()
}

#[test]
fn default_page_geometry() {
    let cfg = LayoutConfig::default();
    let layout = pack_layout(&items(&[(800, 600); 4]), &cfg).unwrap();
    assert_eq!((layout.page_width, layout.page_height), (4000, 2666));
    assert_eq!(layout.cell, CellSize::square(1280));
    assert_eq!(layout.cell.to_string(), "1280×1280");
    // two rows of 1280 plus a gap do not fit in 2566
    assert_eq!(layout.pages.len(), 2);
    assert_eq!(layout.pages[0].placements.len(), 3);
    let xs: Vec<u32> = layout.pages[0]
        .placements
        .iter()
        .map(|p| p.target.x)
        .collect();
    assert_eq!(xs, vec![50, 1360, 2670]);
}

#[test]
fn cell_string_round_trips() {
    let layout = pack_layout(&items(&[(10, 10)]), &LayoutConfig::default()).unwrap();
    let parsed: CellSize = layout.cell.to_string().parse().unwrap();
    assert_eq!(parsed, layout.cell);
    assert!("12x12".parse::<CellSize>().is_err());
}

#[test]
fn short_last_row_is_centered() {
    let cfg = square_page(3, StartPosition::Margin);
    let layout = pack_layout(&items(&[(64, 64); 7]), &cfg).unwrap();
    assert_eq!(layout.cell, CellSize::square(326));
    assert_eq!(layout.pages.len(), 1);
    let page = &layout.pages[0];
    let full: Vec<u32> = page.placements[..3].iter().map(|p| p.target.x).collect();
    assert_eq!(full, vec![0, 336, 672]);
    let last = &page.placements[6];
    assert_eq!(last.target.x, (1000 - 326) / 2);
    assert_eq!(last.target.y, 2 * 336);
}

#[test]
fn fewer_items_than_columns_are_centered() {
    let cfg = square_page(3, StartPosition::Margin);
    let layout = pack_layout(&items(&[(64, 64); 2]), &cfg).unwrap();
    let xs: Vec<u32> = layout.pages[0]
        .placements
        .iter()
        .map(|p| p.target.x)
        .collect();
    // block of 326 + 10 + 326 centered in 1000
    assert_eq!(xs, vec![169, 505]);
}

#[test]
fn centered_start_centers_block_vertically() {
    let cfg = square_page(3, StartPosition::MarginPlusPaddingCentered);
    let layout = pack_layout(&items(&[(64, 64); 3]), &cfg).unwrap();
    assert_eq!(layout.cell, CellSize::square(320));
    let page = &layout.pages[0];
    let top = page.placements[0].target.y;
    let bottom = page.placements[0].target.bottom();
    assert_eq!(top, 340);
    assert_eq!(top, 1000 - 1 - bottom);
    let xs: Vec<u32> = page.placements.iter().map(|p| p.target.x).collect();
    assert_eq!(xs, vec![10, 340, 670]);
}

#[test]
fn plain_padding_start_has_outer_gaps() {
    let cfg = square_page(2, StartPosition::MarginPlusPadding);
    let layout = pack_layout(&items(&[(64, 64); 2]), &cfg).unwrap();
    // (1000 - 3 * 10) / 2
    assert_eq!(layout.cell, CellSize::square(485));
    let p = &layout.pages[0].placements;
    assert_eq!((p[0].target.x, p[0].target.y), (10, 10));
    assert_eq!(p[1].target.x, 505);
}

#[test]
fn fill_modes_size_content() {
    let sizes = [(330, 165), (40, 80)];
    let run = |fill| {
        let cfg = LayoutConfig {
            fill,
            ..square_page(2, StartPosition::Margin)
        };
        pack_layout(&items(&sizes), &cfg).unwrap().pages.remove(0)
    };
    let cell = 495;

    let page = run(FillMode::FitSmaller);
    assert_eq!(page.placements[0].resize_to(), (330, 165));
    assert_eq!(page.placements[1].resize_to(), (40, 80));

    let page = run(FillMode::FitLongSide);
    assert_eq!(page.placements[0].resize_to(), (cell, 247));
    assert_eq!(page.placements[1].resize_to(), (247, cell));

    for fill in [FillMode::Stretch, FillMode::CropSquare] {
        let page = run(fill);
        for p in &page.placements {
            assert_eq!(p.resize_to(), (cell, cell));
            assert_eq!(p.content, p.target);
        }
    }

    // content sits centered in its cell
    let page = run(FillMode::FitSmaller);
    let p = &page.placements[0];
    assert_eq!(p.content.x, p.target.x + (cell - 330) / 2);
    assert_eq!(p.content.y, p.target.y + (cell - 165) / 2);
}

#[test]
fn no_items_is_an_error_but_plan_is_empty() {
    let cfg = LayoutConfig::default();
    let none: Vec<LayoutItem<String>> = Vec::new();
    assert!(matches!(pack_layout(&none, &cfg), Err(SheetError::Empty)));
    let plan = LayoutPlan::new(&none, &cfg);
    assert_eq!(plan.page_count(), 0);
    assert_eq!(plan.cell().to_string(), "0×0");
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = LayoutConfig {
        per_row: 0,
        ..Default::default()
    };
    assert!(matches!(
        pack_layout(&items(&[(1, 1)]), &cfg),
        Err(SheetError::InvalidInput(_))
    ));
}

#[test]
fn layout_is_idempotent() {
    let cfg = LayoutConfig::default();
    let sizes = items(&[(300, 200), (50, 900), (1024, 1024), (7, 3), (640, 480)]);
    let a = pack_layout(&sizes, &cfg).unwrap();
    let b = pack_layout(&sizes, &cfg).unwrap();
    assert_eq!(a, b);
}

fn check_layout(layout: &Layout, n: usize, check_bounds: bool, ctx: &str) {
    let mut seen = vec![0usize; n];
    let mut next = 0usize;
    for page in &layout.pages {
        assert!(!page.placements.is_empty(), "{ctx}: empty page");
        for (i, p) in page.placements.iter().enumerate() {
            // items keep their order across pages
            assert_eq!(p.item, next, "{ctx}");
            next += 1;
            seen[p.item] += 1;
            assert!(p.target.contains(&p.content), "{ctx}: content outside cell");
            if check_bounds {
                assert!(
                    p.target.x + p.target.w <= page.width && p.target.y + p.target.h <= page.height,
                    "{ctx}: cell outside page"
                );
            }
            for q in &page.placements[i + 1..] {
                assert!(!p.target.overlaps(&q.target), "{ctx}: overlapping cells");
            }
        }
    }
    assert!(seen.iter().all(|&c| c == 1), "{ctx}: item placed {seen:?}");
}

#[test]
fn one_per_row_on_a_landscape_page_fits_the_height() {
    let cfg = LayoutConfig {
        per_row: 1,
        ..Default::default()
    };
    let layout = pack_layout(&items(&[(800, 600); 2]), &cfg).unwrap();
    // usable 3900x2566: the cell is bound by the height and centered across
    assert_eq!(layout.cell, CellSize::square(2566));
    assert_eq!(layout.pages.len(), 2);
    for page in &layout.pages {
        let t = page.placements[0].target;
        assert_eq!((t.x, t.y, t.w, t.h), (717, 50, 2566, 2566));
        assert!(t.y + t.h <= page.height && t.x + t.w <= page.width);
    }

    let wide = LayoutConfig {
        aspect_ratio: "4:1".into(),
        per_row: 2,
        start: StartPosition::MarginPlusPadding,
        ..Default::default()
    };
    let layout = pack_layout(&items(&[(10, 10); 3]), &wide).unwrap();
    // page 4000x1000, usable height 900 minus two outer gaps
    assert_eq!(layout.cell, CellSize::square(840));
    let t = layout.pages[0].placements[1].target;
    assert!(t.y + t.h <= 1000 - 50);
    let first = layout.pages[0].placements[0].target;
    assert_eq!(first.x, 50 + (3900 - (2 * 840 + 30)) / 2);
}

#[test]
fn oversized_margin_and_padding_saturate() {
    for (margin, padding) in [(3_000_000_000, 10), (0, u32::MAX), (u32::MAX, u32::MAX)] {
        let cfg = LayoutConfig {
            page_width: 200,
            margin,
            padding,
            per_row: 3,
            start: StartPosition::MarginPlusPaddingCentered,
            ..Default::default()
        };
        let layout = pack_layout(&items(&[(30, 20); 7]), &cfg).unwrap();
        assert_eq!(layout.num_items(), 7, "margin {margin} padding {padding}");
        for stack in [FillMode::EqualWidthStack, FillMode::EqualHeightStack] {
            let cfg = LayoutConfig {
                fill: stack,
                ..cfg.clone()
            };
            assert_eq!(pack_layout(&items(&[(30, 20); 7]), &cfg).unwrap().num_items(), 7);
        }
    }
}

#[test]
fn random_grids_are_disjoint_and_cover_every_item() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let fills = [
        FillMode::FitSmaller,
        FillMode::Stretch,
        FillMode::FitLongSide,
        FillMode::CropSquare,
    ];
    let starts = [
        StartPosition::Margin,
        StartPosition::MarginPlusPadding,
        StartPosition::MarginPlusPaddingCentered,
    ];
    let ratios = ["1:1", "2:3", "3:4", "3:2", "16:9"];
    for round in 0..200 {
        let n = rng.gen_range(1..40);
        let sizes: Vec<(u32, u32)> = (0..n)
            .map(|_| (rng.gen_range(1..2000), rng.gen_range(1..2000)))
            .collect();
        let cfg = LayoutConfig {
            page_width: rng.gen_range(200..3000),
            aspect_ratio: ratios[rng.gen_range(0..ratios.len())].into(),
            per_row: rng.gen_range(1..8),
            margin: rng.gen_range(0..40),
            padding: rng.gen_range(0..20),
            start: starts[rng.gen_range(0..starts.len())],
            fill: fills[rng.gen_range(0..fills.len())],
            ..Default::default()
        };
        let layout = pack_layout(&items(&sizes), &cfg).unwrap();
        check_layout(&layout, n, true, &format!("round {round}: {cfg:?}"));
        let per_page = layout.pages[0].placements.len();
        for page in &layout.pages[..layout.pages.len() - 1] {
            assert_eq!(page.placements.len(), per_page, "round {round}");
        }
    }
}

#[test]
fn random_stacks_are_disjoint_and_cover_every_item() {
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..200 {
        let n = rng.gen_range(1..30);
        let sizes: Vec<(u32, u32)> = (0..n)
            .map(|_| (rng.gen_range(1..1500), rng.gen_range(1..1500)))
            .collect();
        let fill = if rng.gen_bool(0.5) {
            FillMode::EqualWidthStack
        } else {
            FillMode::EqualHeightStack
        };
        let cfg = LayoutConfig {
            page_width: rng.gen_range(300..2000),
            aspect_ratio: "3:2".into(),
            per_row: rng.gen_range(1..5),
            margin: rng.gen_range(0..30),
            padding: rng.gen_range(0..15),
            fill,
            ..Default::default()
        };
        let layout = pack_layout(&items(&sizes), &cfg).unwrap();
        check_layout(&layout, n, false, &format!("round {round}: {cfg:?}"));
    }
}
