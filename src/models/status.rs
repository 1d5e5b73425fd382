use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Auto,
    On,
    Off,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Auto => "auto",
            NetworkMode::On => "on",
            NetworkMode::Off => "off",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(NetworkMode::Auto),
            "on" => Ok(NetworkMode::On),
            "off" => Ok(NetworkMode::Off),
            other => Err(format!("invalid network mode {}, allowed: auto,on,off", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    /// Cache names the current run works on.
    #[serde(default)]
    pub name: Option<Vec<String>>,
    #[serde(default)]
    pub selection: Option<String>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl SeedStatus {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some("running")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Answer of the `status` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Opaque counter, only compared for equality.
    #[serde(default)]
    pub sequence: Option<serde_json::Number>,
    #[serde(default)]
    pub network_mode: Option<NetworkMode>,
    #[serde(default)]
    pub network_available: Option<bool>,
    #[serde(default)]
    pub seed: Option<SeedStatus>,
    #[serde(default, rename = "mapproxy")]
    pub proxy: Option<ProxyStatus>,
}

/// Answer of `countTiles`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileCountResponse {
    pub num_tiles: u64,
    #[serde(default)]
    pub allowed: Option<u64>,
}
