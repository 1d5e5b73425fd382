use crate::models::geometry::{LatLng, Rectangle};

/// A region of one zoom level that is already present in a tile cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageBox {
    pub name: String,
    pub zoom: u32,
    pub bounds: Rectangle,
}

impl CoverageBox {
    /// Parse one `name zoom nelat nelng swlat swlng` line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 6 {
            return None;
        }
        let zoom = parts[1].parse().ok()?;
        let nelat = parts[2].parse().ok()?;
        let nelng = parts[3].parse().ok()?;
        let swlat = parts[4].parse().ok()?;
        let swlng = parts[5].parse().ok()?;
        Some(CoverageBox {
            name: parts[0].to_string(),
            zoom,
            bounds: Rectangle::new(LatLng::new(nelat, nelng), LatLng::new(swlat, swlng)),
        })
    }
}

/// Parse a `getBoxes` body. Lines that don't have exactly six fields are skipped.
pub fn parse_boxes(body: &str) -> Vec<CoverageBox> {
    body.lines().filter_map(CoverageBox::parse_line).collect()
}

/// Viewport and zoom window sent with `getBoxes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxQuery {
    pub bounds: Rectangle,
    pub min_zoom: u32,
    pub max_zoom: u32,
}

impl BoxQuery {
    pub fn around(bounds: Rectangle, zoom: u32, below: u32, above: u32) -> Self {
        BoxQuery {
            bounds,
            min_zoom: zoom.saturating_sub(below),
            max_zoom: zoom.saturating_add(above),
        }
    }
}
