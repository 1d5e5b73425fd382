use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the background layer that is always shown.
pub const BASE_LAYER: &str = "base";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Filled from the key of the `layers` map.
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub caches: Vec<CacheDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayerDescriptor {
    /// XYZ template for the tiles of this layer. `stamp` forces clients to
    /// reload after a configuration change.
    pub fn tile_template(&self, stamp: i64) -> String {
        format!(
            "{}/{{z}}/{{x}}/{{y}}.png?_={}",
            self.url.trim_end_matches('/'),
            stamp
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDescriptor {
    pub name: String,
    #[serde(default)]
    pub cache: Option<CacheStore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStore {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl CacheDescriptor {
    /// Single file stores can be fetched with `getCacheFile`.
    pub fn is_downloadable(&self) -> bool {
        self.cache
            .as_ref()
            .map(|c| c.kind.as_deref() == Some("mbtiles") && c.filename.is_some())
            .unwrap_or(false)
    }
}

/// The `layers` answer split into the base layer and the selectable ones,
/// in the order the backend sent them.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    pub base: Option<LayerDescriptor>,
    pub layers: Vec<LayerDescriptor>,
}

impl LayerSet {
    pub fn from_value(data: Value) -> serde_json::Result<Self> {
        let map: Map<String, Value> = serde_json::from_value(data)?;
        let mut set = LayerSet::default();
        for (name, value) in map {
            let mut layer: LayerDescriptor = serde_json::from_value(value)?;
            layer.name = name.clone();
            if name == BASE_LAYER {
                set.base = Some(layer);
            } else {
                set.layers.push(layer);
            }
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.name == name)
    }
}

/// One entry of `listConfigs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub enabled: bool,
}
