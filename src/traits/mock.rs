use crate::error::{AdminError, Result};
use crate::models::{
    boxes::BoxQuery,
    geometry::Rectangle,
    layer::{ConfigEntry, LayerSet},
    status::{NetworkMode, StatusSnapshot, TileCountResponse},
};
use crate::traits::{AdminApi, SaveSelection};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory backend for session tests. Every call is recorded by name.
#[derive(Default)]
pub(crate) struct MockApi {
    pub calls: Mutex<Vec<String>>,
    /// `None` entries answer with a backend error.
    pub statuses: Mutex<VecDeque<Option<StatusSnapshot>>>,
    pub status_delay: Mutex<Duration>,
    pub layer_set: Mutex<LayerSet>,
    /// Delay and body per `getBoxes` call, an empty queue answers "" at once.
    pub box_answers: Mutex<VecDeque<(Duration, String)>>,
    pub box_queries: Mutex<Vec<BoxQuery>>,
    pub tile_count: Mutex<Option<TileCountResponse>>,
    pub saved: Mutex<Vec<SaveSelection>>,
    pub selections: Mutex<HashMap<String, Vec<Rectangle>>>,
    pub config: Mutex<String>,
    pub fail_with: Mutex<Option<String>>,
}

impl MockApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(name.to_string());
        match self.fail_with.lock().unwrap().clone() {
            Some(status) => Err(AdminError::Backend(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminApi for MockApi {
    async fn status(&self) -> Result<StatusSnapshot> {
        self.record("status")?;
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.statuses.lock().unwrap().pop_front() {
            Some(Some(snapshot)) => Ok(snapshot),
            Some(None) => Err(AdminError::Backend("status failed".to_string())),
            None => Ok(StatusSnapshot::default()),
        }
    }

    async fn layers(&self) -> Result<LayerSet> {
        self.record("layers")?;
        Ok(self.layer_set.lock().unwrap().clone())
    }

    async fn get_config(&self) -> Result<String> {
        self.record("getConfig")?;
        Ok(self.config.lock().unwrap().clone())
    }

    async fn upload_config(&self, yaml: &str) -> Result<()> {
        self.record("uploadConfig")?;
        *self.config.lock().unwrap() = yaml.to_string();
        Ok(())
    }

    async fn list_configs(&self) -> Result<Vec<ConfigEntry>> {
        self.record("listConfigs")?;
        Ok(Vec::new())
    }

    async fn edit_layer(&self, name: &str) -> Result<String> {
        self.record("editLayer")?;
        Ok(format!("layers:\n  - name: {}\n", name))
    }

    async fn save_layer(&self, _name: &str, _yaml: &str) -> Result<()> {
        self.record("saveLayer")
    }

    async fn create_layer(&self, name: &str) -> Result<String> {
        self.record("createLayer")?;
        Ok(format!("layers:\n  - name: {}\n", name))
    }

    async fn enable_layer(&self, _name: &str) -> Result<()> {
        self.record("enableLayer")
    }

    async fn disable_layer(&self, _name: &str) -> Result<()> {
        self.record("disableLayer")
    }

    async fn delete_layer(&self, _name: &str) -> Result<()> {
        self.record("deleteLayer")
    }

    async fn save_selection(&self, request: &SaveSelection) -> Result<Option<u64>> {
        self.record("saveSelection")?;
        self.saved.lock().unwrap().push(request.clone());
        self.selections
            .lock()
            .unwrap()
            .insert(request.name.clone(), request.rectangles.clone());
        Ok(request
            .start_seed
            .as_ref()
            .map(|_| request.rectangles.len() as u64 * 100))
    }

    async fn load_selection(&self, name: &str) -> Result<Vec<Rectangle>> {
        self.record("loadSelection")?;
        self.selections
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AdminError::Backend(format!("file {} not found", name)))
    }

    async fn list_selections(&self) -> Result<Vec<String>> {
        self.record("listSelections")?;
        let mut names: Vec<String> = self.selections.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_selection(&self, name: &str) -> Result<()> {
        self.record("deleteSelection")?;
        self.selections.lock().unwrap().remove(name);
        Ok(())
    }

    async fn count_tiles(&self, rectangles: &[Rectangle]) -> Result<TileCountResponse> {
        self.record("countTiles")?;
        Ok(self
            .tile_count
            .lock()
            .unwrap()
            .unwrap_or(TileCountResponse {
                num_tiles: rectangles.len() as u64,
                allowed: None,
            }))
    }

    async fn kill_seed(&self) -> Result<()> {
        self.record("killSeed")
    }

    async fn set_network_mode(&self, _mode: NetworkMode) -> Result<()> {
        self.record("setNetworkMode")
    }

    async fn get_log(&self, _attach: bool) -> Result<String> {
        self.record("getLog")?;
        Ok("seed log\n".to_string())
    }

    async fn get_cache_file(&self, _name: &str) -> Result<Vec<u8>> {
        self.record("getCacheFile")?;
        Ok(b"SQLite".to_vec())
    }

    async fn get_boxes(&self, query: &BoxQuery) -> Result<String> {
        self.record("getBoxes")?;
        self.box_queries.lock().unwrap().push(*query);
        let answer = self.box_answers.lock().unwrap().pop_front();
        match answer {
            Some((delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            None => Ok(String::new()),
        }
    }

    async fn download_data(&self, _rectangles: &[Rectangle], _name: &str) -> Result<Vec<u8>> {
        self.record("downloadData")?;
        Ok(b"data".to_vec())
    }
}
