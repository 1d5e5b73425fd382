use crate::geometry::projection::{MAX_ZOOM, lat_lng_to_tile};
use crate::models::geometry::{LatLng, Rectangle};

/// Overlap of two rectangles, `None` if they don't share any area.
pub fn intersection(first: &Rectangle, second: &Rectangle) -> Option<Rectangle> {
    let ne = LatLng::new(first.ne.lat.min(second.ne.lat), first.ne.lng.min(second.ne.lng));
    let sw = LatLng::new(first.sw.lat.max(second.sw.lat), first.sw.lng.max(second.sw.lng));
    if ne.lat > sw.lat && ne.lng > sw.lng {
        Some(Rectangle::new(ne, sw))
    } else {
        None
    }
}

/// Number of tiles between the corner tiles of `bounds`, both ends included.
/// Zooms above [`MAX_ZOOM`] count as [`MAX_ZOOM`].
pub fn tile_count_for_bounds(bounds: &Rectangle, zoom: u32) -> u64 {
    let zoom = zoom.min(MAX_ZOOM);
    let ne = lat_lng_to_tile(bounds.ne, zoom);
    let sw = lat_lng_to_tile(bounds.sw, zoom);
    let dx = (ne.x - sw.x).unsigned_abs() + 1;
    let dy = (ne.y - sw.y).unsigned_abs() + 1;
    dx.saturating_mul(dy)
}

/// Tiles covered by a selection at one zoom level.
///
/// Every rectangle loses the tiles it shares with each rectangle before it.
/// This is exact for pairs; where three or more rectangles overlap the shared
/// part is subtracted more than once, the per rectangle count is clamped at 0.
/// The backend computes the authoritative number.
pub fn tile_count(rectangles: &[Rectangle], zoom: u32) -> u64 {
    let mut total = 0u64;
    for (idx, bounds) in rectangles.iter().enumerate() {
        let mut tiles = tile_count_for_bounds(bounds, zoom);
        for other in &rectangles[..idx] {
            if let Some(overlap) = intersection(bounds, other) {
                tiles = tiles.saturating_sub(tile_count_for_bounds(&overlap, zoom));
            }
        }
        total = total.saturating_add(tiles);
    }
    total
}
