use crate::model::{Layout, Rect};
use crate::pipeline::SheetOutput;
use serde_json::{Value, json};

fn rect_json(r: &Rect) -> Value {
    json!({"x": r.x, "y": r.y, "w": r.w, "h": r.h})
}

/// Serialize a `Layout` as `{ pages, meta }`; `keys[i]` names item `i`.
/// Items without a key fall back to their index.
pub fn to_json_layout<K: ToString>(layout: &Layout, keys: &[K]) -> Value {
    let pages_val = layout
        .pages
        .iter()
        .map(|p| {
            let placements: Vec<Value> = p
                .placements
                .iter()
                .enumerate()
                .map(|(slot, pl)| {
                    let key = keys
                        .get(pl.item)
                        .map(|k| k.to_string())
                        .unwrap_or_else(|| pl.item.to_string());
                    json!({
                        "key": key,
                        "index": pl.item,
                        "slot": slot,
                        "target": rect_json(&pl.target),
                        "content": rect_json(&pl.content),
                    })
                })
                .collect();
            json!({
                "id": p.id,
                "width": p.width,
                "height": p.height,
                "placements": placements,
            })
        })
        .collect::<Vec<_>>();
    json!({
        "pages": pages_val,
        "meta": {
            "pageSize": {"w": layout.page_width, "h": layout.page_height},
            "cellSize": layout.cell.to_string(),
            "stats": layout.stats(),
        }
    })
}

/// Run summary as emitted by `--summary`.
pub fn to_json_summary(out: &SheetOutput) -> Value {
    json!({
        "pages": out.page_count,
        "cellSize": out.cell_size(),
        "items": out.item_count,
        "skipped": out.skipped,
        "pageSize": {"w": out.pages.width, "h": out.pages.height},
        "channels": out.pages.channels,
        "exportDir": out.export_dir.as_ref().map(|d| d.display().to_string()),
        "placeholder": out.placeholder,
    })
}
