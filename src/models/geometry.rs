use crate::geometry::projection::MAX_ZOOM;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

/// Axis aligned lat/lon box. `ne` is expected to be north-east of `sw`,
/// callers are responsible for that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(alias = "_northEast")]
    pub ne: LatLng,
    #[serde(alias = "_southWest")]
    pub sw: LatLng,
}

impl Rectangle {
    pub fn new(ne: LatLng, sw: LatLng) -> Self {
        Rectangle { ne, sw }
    }

    /// Inclusive on all edges.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.sw.lat
            && point.lat <= self.ne.lat
            && point.lng >= self.sw.lng
            && point.lng <= self.ne.lng
    }
}

impl From<(f64, f64, f64, f64)> for Rectangle {
    fn from(bounds: (f64, f64, f64, f64)) -> Self {
        Rectangle {
            ne: LatLng::new(bounds.0, bounds.1), // nelat, nelng
            sw: LatLng::new(bounds.2, bounds.3), // swlat, swlng
        }
    }
}

/// Parses `nelat,nelng,swlat,swlng`.
impl FromStr for Rectangle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid coordinate in '{}': {}", s, e))?;
        match parts.as_slice() {
            [nelat, nelng, swlat, swlng] => Ok(Rectangle::from((*nelat, *nelng, *swlat, *swlng))),
            _ => Err(format!(
                "expected nelat,nelng,swlat,swlng but got {} values",
                parts.len()
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub z: u32,
}

/// What the map currently shows. Zoom is fractional while a zoom animation runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: Rectangle,
    pub zoom: f64,
}

impl Viewport {
    /// False for NaN, infinite, negative or too deep zooms.
    pub fn has_valid_zoom(&self) -> bool {
        self.zoom.is_finite() && (0.0..=MAX_ZOOM as f64).contains(&self.zoom)
    }

    /// Integer zoom, `None` while in between two levels.
    pub fn settled_zoom(&self) -> Option<u32> {
        if self.zoom.fract() != 0.0 || self.zoom < 0.0 {
            return None;
        }
        Some(self.zoom as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rectangle() {
        let r: Rectangle = "54.5, 13.5,54.0,13.0".parse().unwrap();
        assert_eq!(r.ne, LatLng::new(54.5, 13.5));
        assert_eq!(r.sw, LatLng::new(54.0, 13.0));
        assert!("1,2,3".parse::<Rectangle>().is_err());
        assert!("1,2,x,4".parse::<Rectangle>().is_err());
    }

    #[test]
    fn test_rectangle_json_shapes() {
        let r = Rectangle::from((10.0, 20.0, 9.0, 19.0));
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"ne":{"lat":10.0,"lng":20.0},"sw":{"lat":9.0,"lng":19.0}}"#);

        let native: Rectangle = serde_json::from_str(
            r#"{"_northEast":{"lat":10.0,"lng":20.0},"_southWest":{"lat":9.0,"lng":19.0}}"#,
        )
        .unwrap();
        assert_eq!(native, r);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = Rectangle::from((10.0, 20.0, 9.0, 19.0));
        assert!(r.contains(LatLng::new(10.0, 20.0)));
        assert!(r.contains(LatLng::new(9.5, 19.5)));
        assert!(!r.contains(LatLng::new(10.1, 19.5)));
    }

    #[test]
    fn test_settled_zoom() {
        let bounds = Rectangle::from((1.0, 1.0, 0.0, 0.0));
        assert_eq!(Viewport { bounds, zoom: 7.0 }.settled_zoom(), Some(7));
        assert_eq!(Viewport { bounds, zoom: 7.25 }.settled_zoom(), None);
        assert_eq!(Viewport { bounds, zoom: f64::NAN }.settled_zoom(), None);
    }

    #[test]
    fn test_valid_zoom() {
        let bounds = Rectangle::from((1.0, 1.0, 0.0, 0.0));
        assert!(Viewport { bounds, zoom: 0.0 }.has_valid_zoom());
        assert!(Viewport { bounds, zoom: 12.5 }.has_valid_zoom());
        assert!(!Viewport { bounds, zoom: f64::NAN }.has_valid_zoom());
        assert!(!Viewport { bounds, zoom: f64::INFINITY }.has_valid_zoom());
        assert!(!Viewport { bounds, zoom: -1.0 }.has_valid_zoom());
        assert!(!Viewport { bounds, zoom: 31.0 }.has_valid_zoom());
    }
}
