use contact_sheet_core::config::{FillMode, LayoutConfig, StartPosition};
use contact_sheet_core::model::{LayoutItem, Rect};
use contact_sheet_core::pack_layout;

fn items(sizes: &[(u32, u32)]) -> Vec<LayoutItem<String>> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| LayoutItem::new(format!("img_{i}"), w, h))
        .collect()
}

fn stack_cfg(fill: FillMode, k: u32, aspect: &str, width: u32) -> LayoutConfig {
    LayoutConfig::builder()
        .page_width(width)
        .aspect_ratio(aspect)
        .per_row(k)
        .margin(0)
        .padding(10)
        .start(StartPosition::Margin)
        .fill(fill)
        .no_borders()
        .build()
}

#[test]
fn single_column_reuses_page_width() {
    let cfg = stack_cfg(FillMode::EqualWidthStack, 1, "1:2", 500);
    let layout = pack_layout(&items(&[(200, 100), (100, 100), (100, 100)]), &cfg).unwrap();
    assert_eq!((layout.page_width, layout.page_height), (500, 1000));
    assert_eq!(layout.cell.to_string(), "500×500");
    assert_eq!(layout.pages.len(), 2);

    let first = &layout.pages[0].placements;
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].target, Rect::new(0, 0, 500, 250));
    assert_eq!(first[1].target, Rect::new(0, 260, 500, 500));

    // 250 + 10 + 500 + 10 + 500 > 1000, so the third item opens a page
    let second = &layout.pages[1].placements;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].item, 2);
    assert_eq!(second[0].target, Rect::new(0, 0, 500, 500));
}

#[test]
fn single_column_shrinks_for_tall_first_item() {
    let cfg = stack_cfg(FillMode::EqualWidthStack, 1, "1:2", 500);
    let layout = pack_layout(&items(&[(100, 300)]), &cfg).unwrap();
    assert_eq!(layout.cell.to_string(), "333×333");
    let p = &layout.pages[0].placements[0];
    assert_eq!((p.target.w, p.target.h), (333, 999));
}

#[test]
fn columns_fill_before_paging() {
    let cfg = stack_cfg(FillMode::EqualWidthStack, 2, "1:1", 1000);
    let sizes = [(495, 495), (990, 495), (495, 990), (495, 495)];
    let layout = pack_layout(&items(&sizes), &cfg).unwrap();
    assert_eq!(layout.cell.to_string(), "495×495");
    assert_eq!(layout.pages.len(), 2);

    let p = &layout.pages[0].placements;
    assert_eq!(p[0].target, Rect::new(0, 0, 495, 495));
    assert_eq!(p[1].target, Rect::new(0, 505, 495, 247));
    assert_eq!(p[2].target, Rect::new(505, 0, 495, 990));
    for pl in p {
        assert!(pl.target.contains(&pl.content));
        assert_eq!(pl.target.w, 495);
    }

    let q = &layout.pages[1].placements;
    assert_eq!(q.len(), 1);
    assert_eq!(q[0].target, Rect::new(0, 0, 495, 495));
}

#[test]
fn lone_short_batch_is_centered_across() {
    let cfg = stack_cfg(FillMode::EqualWidthStack, 3, "1:1", 1000);
    let layout = pack_layout(&items(&[(326, 326), (326, 326)]), &cfg).unwrap();
    let p = &layout.pages[0].placements;
    // one column of width 326 centered in 1000
    assert_eq!(p[0].target, Rect::new(337, 0, 326, 326));
    assert_eq!(p[1].target, Rect::new(337, 336, 326, 326));
}

#[test]
fn rows_share_height() {
    let cfg = stack_cfg(FillMode::EqualHeightStack, 2, "1:1", 1000);
    let sizes = [(495, 495), (248, 495), (990, 495)];
    let layout = pack_layout(&items(&sizes), &cfg).unwrap();
    assert_eq!(layout.pages.len(), 1);
    let p = &layout.pages[0].placements;
    assert_eq!(p[0].target, Rect::new(0, 0, 495, 495));
    assert_eq!(p[1].target, Rect::new(505, 0, 248, 495));
    assert_eq!(p[2].target, Rect::new(0, 505, 990, 495));
    for pl in p {
        assert_eq!(pl.content, pl.target);
    }
}

#[test]
fn oversized_item_still_gets_a_page() {
    let cfg = stack_cfg(FillMode::EqualHeightStack, 1, "1:1", 400);
    let layout = pack_layout(&items(&[(20_000, 10), (10, 10)]), &cfg).unwrap();
    assert_eq!(layout.num_items(), 2);
    for page in &layout.pages {
        for pl in &page.placements {
            assert!(pl.target.w <= 400 && pl.target.h <= 400);
            assert!(pl.target.contains(&pl.content));
        }
    }
}
