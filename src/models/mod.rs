pub mod boxes;
pub mod geometry;
pub mod layer;
pub mod status;
