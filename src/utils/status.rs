use crate::models::layer::{ConfigEntry, LayerSet};
use crate::session::boxes::RenderedBox;
use crate::session::layers::LayerEntry;
use crate::session::poller::{StateClass, StatusView};
use crate::session::selection::TileCountDisplay;
use crate::utils::style::swatch;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| {
            Cell::new(n)
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center)
        })
        .collect()
}

fn table(names: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(header(names))
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED);
    table
}

fn state_cell(state: StateClass) -> Cell {
    let colour = match state {
        StateClass::Ok => Color::Green,
        StateClass::Running => Color::Cyan,
        StateClass::Error => Color::Red,
        StateClass::Unknown => Color::Grey,
    };
    Cell::new(state.as_str())
        .fg(colour)
        .set_alignment(CellAlignment::Center)
}

fn yes_no(on: bool) -> &'static str {
    if on { "✅" } else { "·" }
}

pub fn status_table(view: &StatusView) -> Table {
    let mut table = table(&["", "State", "Details"]);
    table.add_row(vec![
        Cell::new("Network"),
        state_cell(view.indicators.network),
        Cell::new(
            view.network_mode
                .map(|m| format!("mode {}", m))
                .unwrap_or_default(),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Proxy"),
        state_cell(view.indicators.proxy),
        Cell::new(view.proxy_error.clone().unwrap_or_default()),
    ]);

    let mut seed_details = Vec::new();
    if let Some(selection) = &view.seed_selection {
        seed_details.push(format!("selection {}", selection));
    }
    if !view.seed_caches.is_empty() {
        seed_details.push(view.seed_caches.join(", "));
    }
    if let Some(info) = &view.seed_info {
        seed_details.push(info.clone());
    }
    table.add_row(vec![
        Cell::new("Seed"),
        state_cell(view.indicators.seed),
        Cell::new(seed_details.join(" | ")),
    ]);
    table
}

pub fn print_status(view: &StatusView, tiles: Option<TileCountDisplay>) {
    println!("\nStatus:\n{}", status_table(view));
    let b = &view.buttons;
    println!(
        "  start seed {}  kill seed {}  save selection {}  log {}",
        yes_no(b.start_seed),
        yes_no(b.kill_seed),
        yes_no(b.save_selection),
        yes_no(b.download_log)
    );
    if let Some(tiles) = tiles {
        print_tile_count(&tiles);
    }
}

pub fn print_tile_count(tiles: &TileCountDisplay) {
    let marker = if tiles.pending {
        " (estimate)"
    } else if tiles.over_limit {
        " ⚠️ above the allowed limit"
    } else {
        ""
    };
    println!("  🧮 {} tiles{}", tiles.value, marker);
}

pub fn layers_table(entries: &[LayerEntry], layers: &LayerSet) -> Table {
    let mut table = table(&["", "Layer", "URL", "Caches"]);
    for entry in entries {
        let Some(layer) = layers.get(&entry.name) else {
            continue;
        };
        let caches = layer
            .caches
            .iter()
            .map(|c| {
                if c.is_downloadable() {
                    format!("{} ⬇", c.name)
                } else {
                    c.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(if entry.selected { "▶" } else { "" }).set_alignment(CellAlignment::Center),
            Cell::new(&layer.name),
            Cell::new(&layer.url),
            Cell::new(caches),
        ]);
    }
    table
}

pub fn print_layers(entries: &[LayerEntry], layers: &LayerSet) {
    if let Some(base) = &layers.base {
        println!("🗺️ base layer → {}", base.url);
    }
    if entries.is_empty() {
        println!("⚠️ No layers configured.");
        return;
    }
    println!("\nLayers:\n{}", layers_table(entries, layers));
}

pub fn print_configs(configs: &[ConfigEntry]) {
    let mut table = table(&["Config", "Enabled", "Editable", "Path"]);
    for cfg in configs {
        table.add_row(vec![
            Cell::new(&cfg.name),
            Cell::new(yes_no(cfg.enabled)).set_alignment(CellAlignment::Center),
            Cell::new(yes_no(cfg.editable)).set_alignment(CellAlignment::Center),
            Cell::new(&cfg.path),
        ]);
    }
    println!("\nConfigs:\n{}", table);
}

pub fn boxes_table(boxes: &[RenderedBox]) -> Table {
    let mut table = table(&["", "Cache", "Zoom", "NE", "SW"]);
    for b in boxes {
        let bounds = &b.coverage.bounds;
        table.add_row(vec![
            Cell::new(format!("{} {}", swatch(&b.style.color), b.style.hex())),
            Cell::new(&b.coverage.name),
            Cell::new(b.coverage.zoom).set_alignment(CellAlignment::Center),
            Cell::new(format!("{:.4}, {:.4}", bounds.ne.lat, bounds.ne.lng)),
            Cell::new(format!("{:.4}, {:.4}", bounds.sw.lat, bounds.sw.lng)),
        ]);
    }
    table
}

pub fn print_boxes(boxes: &[RenderedBox]) {
    if boxes.is_empty() {
        println!("📦 No coverage boxes in view.");
        return;
    }
    println!("\n📦 {} coverage boxes:\n{}", boxes.len(), boxes_table(boxes));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::boxes::parse_boxes;
    use crate::models::status::{SeedStatus, StatusSnapshot};
    use serde_json::json;

    #[test]
    fn test_status_table_rows() {
        let snapshot = StatusSnapshot {
            network_available: Some(true),
            seed: Some(SeedStatus {
                status: Some("running".into()),
                info: Some("12% done".into()),
                ..SeedStatus::default()
            }),
            ..StatusSnapshot::default()
        };
        let rendered = status_table(&StatusView::derive(&snapshot, true)).to_string();
        assert!(rendered.contains("Network"));
        assert!(rendered.contains("running"));
        assert!(rendered.contains("12% done"));
    }

    #[test]
    fn test_layers_table_marks_selection() {
        let layers = LayerSet::from_value(json!({
            "osm": {"url": "http://h/osm", "caches": [
                {"name": "osm_mb", "cache": {"type": "mbtiles", "filename": "osm.mbtiles"}}
            ]}
        }))
        .unwrap();
        let entries = vec![LayerEntry {
            name: "osm".into(),
            selected: true,
        }];
        let rendered = layers_table(&entries, &layers).to_string();
        assert!(rendered.contains("▶"));
        assert!(rendered.contains("osm_mb ⬇"));
    }

    #[test]
    fn test_boxes_table() {
        let boxes: Vec<RenderedBox> = parse_boxes("A 3 10 20 9 19\nB 16 1 2 0.5 1.5")
            .into_iter()
            .map(RenderedBox::from)
            .collect();
        let rendered = boxes_table(&boxes).to_string();
        assert!(rendered.contains("10.0000, 20.0000"));
        assert!(rendered.contains("#04781d"));
        assert!(rendered.contains("#ea3964"));
    }
}
