use crate::models::geometry::{LatLng, TileCoord};
use std::f64::consts::PI;

/// WebMercator constants
const R_MAJOR: f64 = 6378137.0;
const MAX_LAT: f64 = 85.0511287798; // Max bounds for Web Mercator
pub const TILE_SIZE: f64 = 256.0;
/// Deepest zoom the tile math handles; higher zooms are treated as this one.
pub const MAX_ZOOM: u32 = 30;

/// from longitude, latitude (degrees) → Web Mercator (x, y in meters)
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    // clamp latitude into Mercator’s valid range
    let clamped_lat = lat.clamp(-MAX_LAT, MAX_LAT);

    let x = lon * R_MAJOR * PI / 180.0;
    let lat_rad = clamped_lat * PI / 180.0;
    let y = R_MAJOR * ((PI / 4.0 + lat_rad / 2.0).tan().ln());
    (x, y)
}

/// Pixel position of a point at `zoom`, origin top left, 256 px tiles.
pub fn lat_lng_to_pixel(point: LatLng, zoom: u32) -> (f64, f64) {
    let (x, y) = lon_lat_to_mercator(point.lng, point.lat);
    let scale = TILE_SIZE * 2f64.powi(zoom as i32);
    let half = 0.5 / (PI * R_MAJOR);
    (scale * (half * x + 0.5), scale * (-half * y + 0.5))
}

/// Tile holding `point`. The pixel position is divided by the tile size and
/// rounded to the nearest integer (halves round up).
pub fn lat_lng_to_tile(point: LatLng, zoom: u32) -> TileCoord {
    let (px, py) = lat_lng_to_pixel(point, zoom);
    TileCoord {
        x: round_half_up(px / TILE_SIZE),
        y: round_half_up(py / TILE_SIZE),
        z: zoom,
    }
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}
