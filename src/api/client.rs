use crate::config::Config;
use crate::error::{AdminError, Result};
use crate::models::{
    boxes::BoxQuery,
    geometry::Rectangle,
    layer::{ConfigEntry, LayerSet},
    status::{NetworkMode, StatusSnapshot, TileCountResponse},
};
use crate::traits::{AdminApi, SaveSelection};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

type Query<'a> = Vec<(&'a str, String)>;

/// HTTP client for the `/api/<command>` endpoints of the plugin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base(&config.api_base)
    }

    pub fn with_base(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, command: &str) -> String {
        format!("{}/api/{}", self.base, command)
    }

    /// GET returning the checked JSON envelope.
    async fn request(&self, command: &str, query: Query<'_>) -> Result<Map<String, Value>> {
        debug!("api request {} {:?}", command, query);
        let body: Value = self
            .client
            .get(self.url(command))
            .query(&query)
            .send()
            .await?
            .json()
            .await?;
        check_envelope(body)
    }

    async fn request_data<T: DeserializeOwned>(&self, command: &str, query: Query<'_>) -> Result<T> {
        let mut envelope = self.request(command, query).await?;
        let data = envelope.remove("data").unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// GET for commands that answer with a file instead of an envelope.
    async fn raw(&self, command: &str, query: Query<'_>) -> Result<reqwest::Response> {
        debug!("api raw request {} {:?}", command, query);
        let response = self.client.get(self.url(command)).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(AdminError::Http {
                command: command.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

/// Accept only `{"status": "OK", ...}`, anything else becomes a backend error
/// carrying the reported status.
pub fn check_envelope(body: Value) -> Result<Map<String, Value>> {
    let Value::Object(map) = body else {
        return Err(AdminError::Backend(format!("invalid response {}", body)));
    };
    match map.get("status") {
        Some(Value::String(s)) if s == "OK" => Ok(map),
        Some(Value::String(s)) => Err(AdminError::Backend(s.clone())),
        Some(other) => Err(AdminError::Backend(other.to_string())),
        None => Err(AdminError::Backend("missing".to_string())),
    }
}

fn selection_json(rectangles: &[Rectangle]) -> Result<String> {
    Ok(serde_json::to_string(rectangles)?)
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn status(&self) -> Result<StatusSnapshot> {
        let envelope = self.request("status", vec![]).await?;
        Ok(serde_json::from_value(Value::Object(envelope))?)
    }

    async fn layers(&self) -> Result<LayerSet> {
        let mut envelope = self.request("layers", vec![]).await?;
        let data = envelope
            .remove("data")
            .unwrap_or_else(|| Value::Object(Map::new()));
        Ok(LayerSet::from_value(data)?)
    }

    async fn get_config(&self) -> Result<String> {
        self.request_data("getConfig", vec![]).await
    }

    async fn upload_config(&self, yaml: &str) -> Result<()> {
        let body: Value = self
            .client
            .post(self.url("uploadConfig"))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(yaml.to_string())
            .send()
            .await?
            .json()
            .await?;
        check_envelope(body).map(|_| ())
    }

    async fn list_configs(&self) -> Result<Vec<ConfigEntry>> {
        self.request_data("listConfigs", vec![]).await
    }

    async fn edit_layer(&self, name: &str) -> Result<String> {
        self.request_data("editLayer", vec![("name", name.to_string())])
            .await
    }

    async fn save_layer(&self, name: &str, yaml: &str) -> Result<()> {
        let query = vec![("name", name.to_string()), ("data", yaml.to_string())];
        self.request("saveLayer", query).await.map(|_| ())
    }

    async fn create_layer(&self, name: &str) -> Result<String> {
        self.request_data("createLayer", vec![("name", name.to_string())])
            .await
    }

    async fn enable_layer(&self, name: &str) -> Result<()> {
        let query = vec![("name", name.to_string())];
        self.request("enableLayer", query).await.map(|_| ())
    }

    async fn disable_layer(&self, name: &str) -> Result<()> {
        let query = vec![("name", name.to_string())];
        self.request("disableLayer", query).await.map(|_| ())
    }

    async fn delete_layer(&self, name: &str) -> Result<()> {
        let query = vec![("name", name.to_string())];
        self.request("deleteLayer", query).await.map(|_| ())
    }

    async fn save_selection(&self, request: &SaveSelection) -> Result<Option<u64>> {
        let mut query = vec![
            ("data", selection_json(&request.rectangles)?),
            ("name", request.name.clone()),
        ];
        if let Some(layer) = &request.start_seed {
            query.push(("startSeed", layer.clone()));
        }
        if let Some(days) = request.reload_days {
            query.push(("reloadDays", days.to_string()));
        }
        if let Some(base) = &request.base_layer {
            query.push(("baseLayer", base.clone()));
        }
        let envelope = self.request("saveSelection", query).await?;
        Ok(envelope.get("numTiles").and_then(Value::as_u64))
    }

    async fn load_selection(&self, name: &str) -> Result<Vec<Rectangle>> {
        let data: Option<Vec<Rectangle>> = self
            .request_data("loadSelection", vec![("name", name.to_string())])
            .await?;
        Ok(data.unwrap_or_default())
    }

    async fn list_selections(&self) -> Result<Vec<String>> {
        self.request_data("listSelections", vec![]).await
    }

    async fn delete_selection(&self, name: &str) -> Result<()> {
        let query = vec![("name", name.to_string())];
        self.request("deleteSelection", query).await.map(|_| ())
    }

    async fn count_tiles(&self, rectangles: &[Rectangle]) -> Result<TileCountResponse> {
        let query = vec![("data", selection_json(rectangles)?)];
        let envelope = self.request("countTiles", query).await?;
        Ok(serde_json::from_value(Value::Object(envelope))?)
    }

    async fn kill_seed(&self) -> Result<()> {
        self.request("killSeed", vec![]).await.map(|_| ())
    }

    async fn set_network_mode(&self, mode: NetworkMode) -> Result<()> {
        let query = vec![("mode", mode.as_str().to_string())];
        self.request("setNetworkMode", query).await.map(|_| ())
    }

    async fn get_log(&self, attach: bool) -> Result<String> {
        let query = if attach {
            vec![("attach", "true".to_string())]
        } else {
            vec![]
        };
        Ok(self.raw("getLog", query).await?.text().await?)
    }

    async fn get_cache_file(&self, name: &str) -> Result<Vec<u8>> {
        let response = self
            .raw("getCacheFile", vec![("name", name.to_string())])
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_boxes(&self, query: &BoxQuery) -> Result<String> {
        let params = vec![
            ("nelat", query.bounds.ne.lat.to_string()),
            ("nelng", query.bounds.ne.lng.to_string()),
            ("swlat", query.bounds.sw.lat.to_string()),
            ("swlng", query.bounds.sw.lng.to_string()),
            ("minZoom", query.min_zoom.to_string()),
            ("maxZoom", query.max_zoom.to_string()),
        ];
        Ok(self.raw("getBoxes", params).await?.text().await?)
    }

    async fn download_data(&self, rectangles: &[Rectangle], name: &str) -> Result<Vec<u8>> {
        let query = vec![
            ("data", selection_json(rectangles)?),
            ("name", name.to_string()),
        ];
        Ok(self.raw("downloadData", query).await?.bytes().await?.to_vec())
    }
}
