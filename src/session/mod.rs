//! One controller object per run. It owns the selection, layer list, box
//! overlay and status poller, and executes user actions given as [`Command`]s.

pub mod boxes;
pub mod layers;
pub mod notify;
pub mod poller;
pub mod selection;

use crate::config::Config;
use crate::error::{AdminError, Result};
use crate::models::geometry::{LatLng, Rectangle, Viewport};
use crate::models::layer::ConfigEntry;
use crate::models::status::{NetworkMode, StatusSnapshot};
use crate::traits::{AdminApi, SaveSelection};
use crate::utils::{name::safe_name, yaml::validate_yaml};
use boxes::{BoxRefresher, RenderedBox, pick_topmost};
use layers::{LayerEntry, LayerManager};
use log::{debug, info};
use notify::{Notifier, Toast};
use poller::{PollEvent, StatusPoller, StatusView};
use selection::{SelectionStore, TileCountDisplay};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Everything a user can ask the session to do.
#[derive(Debug, Clone)]
pub enum Command {
    AddRectangle(Rectangle),
    RemoveRectangle(usize),
    EditRectangle { index: usize, rectangle: Rectangle },
    ClearSelection,
    CountTiles,
    SaveSelection { name: String },
    LoadSelection { name: String },
    DeleteSelection { name: String },
    ListSelections,
    StartSeed {
        name: String,
        layer: Option<String>,
        reload_days: Option<u32>,
    },
    KillSeed,
    SetNetworkMode(NetworkMode),
    ShowBoxes(bool),
    MoveViewport(Viewport),
    PickBox(LatLng),
    ReloadLayers,
    SelectLayer(String),
    ListConfigs,
    GetConfig,
    UploadConfig(String),
    EditLayer(String),
    SaveLayer { name: String, yaml: String },
    CreateLayer(String),
    EnableLayer(String),
    DisableLayer(String),
    DeleteLayer(String),
    GetLog { attach: bool },
    GetCacheFile(String),
    DownloadData { name: String },
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Done,
    TileCount(TileCountDisplay),
    Selections(Vec<String>),
    SeedStarted { tiles: Option<u64> },
    Layers(Vec<LayerEntry>),
    Configs(Vec<ConfigEntry>),
    Text(String),
    Bytes(Vec<u8>),
    Picked(Option<RenderedBox>),
}

pub struct Session {
    config: Config,
    api: Arc<dyn AdminApi>,
    notifier: Notifier,
    selection: SelectionStore,
    tile_count: TileCountDisplay,
    layers: LayerManager,
    configs: Vec<ConfigEntry>,
    boxes: BoxRefresher,
    viewport: watch::Sender<Viewport>,
    snapshot: Option<StatusSnapshot>,
    status: Option<StatusView>,
    poller: Option<StatusPoller>,
    poll_events: Option<mpsc::UnboundedReceiver<PollEvent>>,
}

impl Session {
    /// Create the session and the receiving end of its toast queue.
    pub fn new(config: Config, api: Arc<dyn AdminApi>) -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (notifier, toasts) = Notifier::new(&config);
        let (lat, lng) = config.initial_center;
        // roughly one screen around the start position
        let start = Viewport {
            bounds: Rectangle::from((lat + 2.0, lng + 4.0, lat - 2.0, lng - 4.0)),
            zoom: config.initial_zoom,
        };
        let (viewport, viewport_rx) = watch::channel(start);
        let boxes = BoxRefresher::new(api.clone(), viewport_rx, &config);

        let session = Session {
            config,
            api,
            notifier,
            selection: SelectionStore::new(),
            tile_count: TileCountDisplay::default(),
            layers: LayerManager::new(),
            configs: Vec::new(),
            boxes,
            viewport,
            snapshot: None,
            status: None,
            poller: None,
            poll_events: None,
        };
        (session, toasts)
    }

    pub fn start_polling(&mut self) {
        if self.poller.is_some() {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.poller = Some(StatusPoller::spawn(
            self.api.clone(),
            self.config.poll_interval,
            tx,
        ));
        self.poll_events = Some(rx);
    }

    /// Wait for the next poller event and apply it. `None` once polling stopped.
    pub async fn next_poll_event(&mut self) -> Option<PollEvent> {
        let event = self.recv_poll_event().await?;
        self.handle_poll_event(&event).await;
        Some(event)
    }

    /// Wait for the next poller event without applying it. Safe to race in a
    /// `select!`: a dropped call loses no event.
    pub async fn recv_poll_event(&mut self) -> Option<PollEvent> {
        self.poll_events.as_mut()?.recv().await
    }

    pub async fn handle_poll_event(&mut self, event: &PollEvent) {
        match event {
            PollEvent::Snapshot(snapshot) => {
                self.status = Some(StatusView::derive(snapshot, !self.selection.is_empty()));
                self.snapshot = Some(snapshot.clone());
            }
            PollEvent::SequenceChanged => {
                info!("backend configuration changed, reloading layers");
                if let Err(e) = self.reload_lists().await {
                    self.notifier.error(e);
                }
            }
            PollEvent::Failed(_) => {}
        }
    }

    /// Stop the poller and any pending box refresh.
    pub fn shutdown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.poll_events = None;
        self.boxes.cancel();
        debug!("session shut down");
    }

    /// Run a command, reporting failures as error toasts.
    pub async fn run(&mut self, command: Command) -> Option<Outcome> {
        match self.dispatch(command).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.notifier.error(&e);
                None
            }
        }
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        debug!("command {:?}", command);
        match command {
            Command::AddRectangle(rectangle) => {
                self.selection.add(rectangle);
                self.update_tile_count().await
            }
            Command::RemoveRectangle(index) => {
                self.selection.remove(index);
                self.update_tile_count().await
            }
            Command::EditRectangle { index, rectangle } => {
                self.selection.edit(index, rectangle);
                self.update_tile_count().await
            }
            Command::ClearSelection => {
                self.selection.clear();
                self.update_tile_count().await
            }
            Command::CountTiles => self.update_tile_count().await,
            Command::SaveSelection { name } => {
                let name = self.checked_name(&name)?;
                let request = SaveSelection {
                    name: name.clone(),
                    rectangles: self.selection.rectangles().to_vec(),
                    ..SaveSelection::default()
                };
                self.api.save_selection(&request).await?;
                self.notifier.info(format!(
                    "saved {} boxes to {}",
                    request.rectangles.len(),
                    name
                ));
                Ok(Outcome::Done)
            }
            Command::LoadSelection { name } => {
                let rectangles = self.api.load_selection(&name).await?;
                self.selection.replace(rectangles);
                self.update_tile_count().await
            }
            Command::DeleteSelection { name } => {
                self.api.delete_selection(&name).await?;
                self.notifier.info(format!("deleted selection {}", name));
                Ok(Outcome::Done)
            }
            Command::ListSelections => Ok(Outcome::Selections(self.api.list_selections().await?)),
            Command::StartSeed {
                name,
                layer,
                reload_days,
            } => self.start_seed(&name, layer, reload_days).await,
            Command::KillSeed => {
                self.api.kill_seed().await?;
                self.notifier.info("seed stopped");
                Ok(Outcome::Done)
            }
            Command::SetNetworkMode(mode) => {
                self.api.set_network_mode(mode).await?;
                Ok(Outcome::Done)
            }
            Command::ShowBoxes(on) => {
                self.boxes.set_show_boxes(on);
                Ok(Outcome::Done)
            }
            Command::MoveViewport(viewport) => {
                if !viewport.has_valid_zoom() {
                    return Err(AdminError::Invalid(format!("invalid zoom {}", viewport.zoom)));
                }
                self.viewport.send_replace(viewport);
                self.boxes.schedule();
                Ok(Outcome::Done)
            }
            Command::PickBox(point) => {
                let overlay = self.boxes.overlay();
                let picked = pick_topmost(&overlay, point).cloned();
                if let Some(b) = &picked {
                    self.notifier
                        .info(format!("{}, zoom={}", b.coverage.name, b.coverage.zoom));
                }
                Ok(Outcome::Picked(picked))
            }
            Command::ReloadLayers => {
                let entries = self.layers.load(self.api.as_ref()).await?;
                Ok(Outcome::Layers(entries))
            }
            Command::SelectLayer(name) => {
                self.layers.select(&name);
                Ok(Outcome::Layers(self.layers.entries()))
            }
            Command::ListConfigs => {
                self.configs = self.api.list_configs().await?;
                Ok(Outcome::Configs(self.configs.clone()))
            }
            Command::GetConfig => Ok(Outcome::Text(self.api.get_config().await?)),
            Command::UploadConfig(yaml) => {
                validate_yaml(&yaml)?;
                self.api.upload_config(&yaml).await?;
                self.notifier.info("config saved");
                Ok(Outcome::Done)
            }
            Command::EditLayer(name) => Ok(Outcome::Text(self.api.edit_layer(&name).await?)),
            Command::SaveLayer { name, yaml } => {
                validate_yaml(&yaml)?;
                self.api.save_layer(&name, &yaml).await?;
                self.notifier.info(format!("layer {} saved", name));
                Ok(Outcome::Done)
            }
            Command::CreateLayer(name) => {
                let name = self.checked_name(&name)?;
                Ok(Outcome::Text(self.api.create_layer(&name).await?))
            }
            Command::EnableLayer(name) => {
                self.api.enable_layer(&name).await?;
                Ok(Outcome::Done)
            }
            Command::DisableLayer(name) => {
                self.api.disable_layer(&name).await?;
                Ok(Outcome::Done)
            }
            Command::DeleteLayer(name) => {
                self.api.delete_layer(&name).await?;
                self.notifier.info(format!("layer {} deleted", name));
                Ok(Outcome::Done)
            }
            Command::GetLog { attach } => Ok(Outcome::Text(self.api.get_log(attach).await?)),
            Command::GetCacheFile(name) => {
                Ok(Outcome::Bytes(self.api.get_cache_file(&name).await?))
            }
            Command::DownloadData { name } => {
                let name = self.checked_name(&name)?;
                let data = self
                    .api
                    .download_data(self.selection.rectangles(), &name)
                    .await?;
                Ok(Outcome::Bytes(data))
            }
        }
    }

    async fn start_seed(
        &mut self,
        name: &str,
        layer: Option<String>,
        reload_days: Option<u32>,
    ) -> Result<Outcome> {
        if self.selection.is_empty() {
            return Err(AdminError::Invalid("no boxes selected".to_string()));
        }
        let name = self.checked_name(name)?;
        let layer = match layer {
            Some(layer) => layer,
            None => self
                .layers
                .selected()
                .map(|l| l.name.clone())
                .ok_or_else(|| AdminError::Invalid("no layer selected".to_string()))?,
        };
        let request = SaveSelection {
            name,
            rectangles: self.selection.rectangles().to_vec(),
            start_seed: Some(layer.clone()),
            reload_days,
            base_layer: None,
        };
        let tiles = self.api.save_selection(&request).await?;
        match tiles {
            Some(n) => self
                .notifier
                .info(format!("seed started for {} with {} tiles", layer, n)),
            None => self.notifier.info(format!("seed started for {}", layer)),
        }
        Ok(Outcome::SeedStarted { tiles })
    }

    fn checked_name(&self, name: &str) -> Result<String> {
        let name = safe_name(name);
        if name.is_empty() {
            return Err(AdminError::Invalid("empty name".to_string()));
        }
        Ok(name)
    }

    /// Show the local estimate right away, then the backend's number.
    async fn update_tile_count(&mut self) -> Result<Outcome> {
        let zoom = self.viewport.borrow().zoom.max(0.0).floor() as u32;
        self.tile_count = TileCountDisplay {
            value: self.selection.tile_count(zoom),
            pending: true,
            over_limit: self.tile_count.over_limit,
        };
        if let Some(snapshot) = &self.snapshot {
            self.status = Some(StatusView::derive(snapshot, !self.selection.is_empty()));
        }

        let counted = self.api.count_tiles(self.selection.rectangles()).await?;
        self.tile_count = TileCountDisplay {
            value: counted.num_tiles,
            pending: false,
            over_limit: counted
                .allowed
                .map(|allowed| counted.num_tiles > allowed)
                .unwrap_or(false),
        };
        Ok(Outcome::TileCount(self.tile_count))
    }

    async fn reload_lists(&mut self) -> Result<()> {
        self.layers.load(self.api.as_ref()).await?;
        self.configs = self.api.list_configs().await?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn tile_count(&self) -> TileCountDisplay {
        self.tile_count
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn configs(&self) -> &[ConfigEntry] {
        &self.configs
    }

    pub fn boxes(&self) -> &BoxRefresher {
        &self.boxes
    }

    pub fn viewport(&self) -> Viewport {
        *self.viewport.borrow()
    }

    pub fn status(&self) -> Option<&StatusView> {
        self.status.as_ref()
    }

    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        self.snapshot.as_ref()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
