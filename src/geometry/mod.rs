pub mod projection;
pub mod tiles;

pub use tiles::{intersection, tile_count, tile_count_for_bounds};
