use crate::error::Result;
use crate::models::{
    boxes::BoxQuery,
    geometry::Rectangle,
    layer::{ConfigEntry, LayerSet},
    status::{NetworkMode, StatusSnapshot, TileCountResponse},
};
use async_trait::async_trait;

/// Parameters of `saveSelection`. With `start_seed` set the backend starts a
/// seed run for that layer right after storing the selection.
#[derive(Debug, Clone, Default)]
pub struct SaveSelection {
    pub name: String,
    pub rectangles: Vec<Rectangle>,
    pub start_seed: Option<String>,
    pub reload_days: Option<u32>,
    pub base_layer: Option<String>,
}

/// The REST backend of the tile proxy.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn status(&self) -> Result<StatusSnapshot>;
    async fn layers(&self) -> Result<LayerSet>;

    async fn get_config(&self) -> Result<String>;
    async fn upload_config(&self, yaml: &str) -> Result<()>;
    async fn list_configs(&self) -> Result<Vec<ConfigEntry>>;
    async fn edit_layer(&self, name: &str) -> Result<String>;
    async fn save_layer(&self, name: &str, yaml: &str) -> Result<()>;
    async fn create_layer(&self, name: &str) -> Result<String>;
    async fn enable_layer(&self, name: &str) -> Result<()>;
    async fn disable_layer(&self, name: &str) -> Result<()>;
    async fn delete_layer(&self, name: &str) -> Result<()>;

    /// Returns the tile number when a seed was started.
    async fn save_selection(&self, request: &SaveSelection) -> Result<Option<u64>>;
    async fn load_selection(&self, name: &str) -> Result<Vec<Rectangle>>;
    async fn list_selections(&self) -> Result<Vec<String>>;
    async fn delete_selection(&self, name: &str) -> Result<()>;
    async fn count_tiles(&self, rectangles: &[Rectangle]) -> Result<TileCountResponse>;

    async fn kill_seed(&self) -> Result<()>;
    async fn set_network_mode(&self, mode: NetworkMode) -> Result<()>;

    async fn get_log(&self, attach: bool) -> Result<String>;
    async fn get_cache_file(&self, name: &str) -> Result<Vec<u8>>;
    async fn get_boxes(&self, query: &BoxQuery) -> Result<String>;
    async fn download_data(&self, rectangles: &[Rectangle], name: &str) -> Result<Vec<u8>>;
}
