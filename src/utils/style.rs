use colorgrad::Color;

/// Colour bands for coverage boxes: 0-10, 11-13, 14-16, 17-20.
const BANDS: [(u32, [u8; 3]); 4] = [
    (10, [0x04, 0x78, 0x1d]),
    (13, [0xd4, 0x93, 0x11]),
    (16, [0xea, 0x39, 0x64]),
    (20, [0x1f, 0x7c, 0xef]),
];
const MAX_STYLED_ZOOM: u32 = 20;
const FILL_FROM_ZOOM: u32 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub color: Color,
    pub weight: u32,
    pub fill_opacity: f32,
}

impl BoxStyle {
    pub fn hex(&self) -> String {
        let [r, g, b, _] = self.color.to_rgba8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Outline style of a coverage box. Zooms above 20 use the zoom 20 colour,
/// from zoom 15 on boxes get a light fill.
pub fn box_style(zoom: u32) -> BoxStyle {
    let zoom = zoom.min(MAX_STYLED_ZOOM);
    let [r, g, b] = BANDS
        .iter()
        .find(|(upto, _)| zoom <= *upto)
        .map(|(_, rgb)| *rgb)
        .unwrap_or(BANDS[BANDS.len() - 1].1);
    BoxStyle {
        color: Color::from_rgba8(r, g, b, 255),
        weight: 1,
        fill_opacity: if zoom >= FILL_FROM_ZOOM { 0.1 } else { 0.0 },
    }
}

/// Single coloured block for terminal output.
pub fn swatch(color: &Color) -> String {
    let [r, g, b, _] = color.to_rgba8();
    format!("\x1b[38;2;{};{};{}m█\x1b[0m", r, g, b)
}
