pub mod admin;
#[cfg(test)]
pub(crate) mod mock;

pub use admin::{AdminApi, SaveSelection};
