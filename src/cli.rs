use clap::{Parser, Subcommand};
use seedmap::Config;
use seedmap::geometry::projection::MAX_ZOOM;
use seedmap::models::geometry::Rectangle;
use seedmap::models::status::NetworkMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seedmap", version, about = "Manage selections, seeds and caches of a map tile proxy")]
pub struct Cli {
    /// Plugin base URL, e.g. http://localhost:8080/plugins/mapproxy
    #[arg(long, global = true)]
    pub api: Option<String>,

    /// URL of the web GUI page, the API base is derived from it
    #[arg(long, global = true)]
    pub page: Option<String>,

    /// Map zoom used for tile estimates and coverage boxes
    #[arg(long, global = true, value_parser = parse_zoom)]
    pub zoom: Option<f64>,

    /// Don't fetch coverage boxes
    #[arg(long, global = true)]
    pub no_boxes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_zoom(s: &str) -> Result<f64, String> {
    let zoom: f64 = s.parse().map_err(|e| format!("invalid zoom '{}': {}", s, e))?;
    if !zoom.is_finite() || !(0.0..=MAX_ZOOM as f64).contains(&zoom) {
        return Err(format!("zoom must be between 0 and {}", MAX_ZOOM));
    }
    Ok(zoom)
}

impl Cli {
    pub fn config(&self) -> Config {
        let mut config = match &self.page {
            Some(url) => Config::from_page_url(url),
            None => Config::default(),
        };
        if let Some(api) = &self.api {
            config.api_base = api.clone();
        }
        if let Some(zoom) = self.zoom {
            config.initial_zoom = zoom;
        }
        if self.no_boxes {
            config.show_boxes = false;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show proxy, network and seed state once
    Status,
    /// Keep polling the status and print changes
    Watch,
    /// List tile layers
    Layers {
        #[arg(long)]
        select: Option<String>,
    },
    /// List layer configuration files
    Configs,
    /// Count the tiles covered by some rectangles
    Count {
        /// nelat,nelng,swlat,swlng (repeatable)
        #[arg(long = "rect", required = true, allow_hyphen_values = true)]
        rects: Vec<Rectangle>,
    },
    #[command(subcommand)]
    Selection(SelectionCommand),
    #[command(subcommand)]
    Seed(SeedCommand),
    /// Switch the network mode of the proxy
    Network { mode: NetworkMode },
    #[command(subcommand)]
    Config(ConfigCommand),
    #[command(subcommand)]
    Layer(LayerCommand),
    /// Print the log of the current seed run
    Log {
        /// Whole file instead of the tail
        #[arg(long)]
        attach: bool,
    },
    /// Download a single file cache
    CacheFile {
        name: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Download tile data for some rectangles
    Download {
        name: String,
        #[arg(long = "rect", required = true, allow_hyphen_values = true)]
        rects: Vec<Rectangle>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the coverage boxes of a viewport
    Boxes {
        #[arg(long, allow_hyphen_values = true)]
        rect: Rectangle,
    },
    /// Name the most detailed coverage box at a position
    #[command(allow_negative_numbers = true)]
    Pick {
        #[arg(long, allow_hyphen_values = true)]
        rect: Rectangle,
        lat: f64,
        lng: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum SelectionCommand {
    List,
    Show {
        name: String,
    },
    Save {
        /// Defaults to selection-<date>
        name: Option<String>,
        #[arg(long = "rect", required = true, allow_hyphen_values = true)]
        rects: Vec<Rectangle>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SeedCommand {
    /// Save a selection and start seeding it
    Start {
        /// Load this stored selection instead of passing rectangles
        #[arg(long)]
        selection: Option<String>,
        #[arg(long = "rect", allow_hyphen_values = true)]
        rects: Vec<Rectangle>,
        /// Layer to seed, defaults to the first one
        #[arg(long)]
        layer: Option<String>,
        /// Refresh tiles older than this many days
        #[arg(long)]
        reload_days: Option<u32>,
        #[arg(long)]
        name: Option<String>,
        /// Show progress until the run ends
        #[arg(long)]
        follow: bool,
    },
    Kill,
    /// Show progress of the current run
    Follow,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Get,
    /// Validate and upload a new main config
    Upload { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum LayerCommand {
    Edit { name: String },
    Create { name: String },
    Save { name: String, file: PathBuf },
    Enable { name: String },
    Disable { name: String },
    Delete { name: String },
}
