use crate::error::Result;
use crate::models::layer::{LayerDescriptor, LayerSet};
use crate::traits::AdminApi;
use chrono::Utc;
use log::debug;

/// A tile layer currently shown on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LayerSelection {
    #[default]
    None,
    Selected(String),
}

/// One row of the layer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub name: String,
    pub selected: bool,
}

/// Base layer plus exactly one selectable layer on the map.
#[derive(Debug, Default)]
pub struct LayerManager {
    layers: LayerSet,
    selection: LayerSelection,
    active: Vec<MapLayer>,
    stamp: i64,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the layer list and rebuild the map layers. Tile URLs get a fresh
    /// timestamp so changed layers are not served from the browser cache.
    pub async fn load(&mut self, api: &dyn AdminApi) -> Result<Vec<LayerEntry>> {
        let layers = api.layers().await?;
        Ok(self.apply(layers, Utc::now().timestamp_millis()))
    }

    pub fn apply(&mut self, layers: LayerSet, stamp: i64) -> Vec<LayerEntry> {
        self.active.clear();
        self.layers = layers;
        self.stamp = stamp;

        if let Some(base) = &self.layers.base {
            self.active.push(map_layer(base, stamp));
        }

        let keep = match &self.selection {
            LayerSelection::Selected(name) if self.layers.get(name).is_some() => Some(name.clone()),
            _ => None,
        };
        let next = keep.or_else(|| self.layers.layers.first().map(|l| l.name.clone()));
        self.selection = match next {
            Some(name) => {
                if let Some(layer) = self.layers.get(&name) {
                    self.active.push(map_layer(layer, stamp));
                }
                LayerSelection::Selected(name)
            }
            None => LayerSelection::None,
        };
        debug!("layers loaded, selection {:?}", self.selection);
        self.entries()
    }

    /// Swap the shown layer. Unknown names are ignored and return false.
    pub fn select(&mut self, name: &str) -> bool {
        let Some(layer) = self.layers.get(name) else {
            return false;
        };
        let layer = map_layer(layer, self.stamp);
        if let LayerSelection::Selected(old) = &self.selection {
            let old = old.clone();
            self.active.retain(|l| l.name != old);
        }
        self.active.push(layer);
        self.selection = LayerSelection::Selected(name.to_string());
        true
    }

    pub fn entries(&self) -> Vec<LayerEntry> {
        self.layers
            .layers
            .iter()
            .map(|l| LayerEntry {
                name: l.name.clone(),
                selected: self.selection == LayerSelection::Selected(l.name.clone()),
            })
            .collect()
    }

    pub fn selection(&self) -> &LayerSelection {
        &self.selection
    }

    pub fn selected(&self) -> Option<&LayerDescriptor> {
        match &self.selection {
            LayerSelection::Selected(name) => self.layers.get(name),
            LayerSelection::None => None,
        }
    }

    pub fn active_layers(&self) -> &[MapLayer] {
        &self.active
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }
}

fn map_layer(layer: &LayerDescriptor, stamp: i64) -> MapLayer {
    MapLayer {
        name: layer.name.clone(),
        template: layer.tile_template(stamp),
    }
}
