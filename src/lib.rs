pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod session;
pub mod traits;
pub mod utils;

pub use api::ApiClient;
pub use config::Config;
pub use error::{AdminError, Result};
pub use session::{Command, Outcome, Session};
