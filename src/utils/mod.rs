pub mod name;
pub mod status;
pub mod style;
pub mod yaml;
