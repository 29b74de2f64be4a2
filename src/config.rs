use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default portal directory on the venue host.
pub const DEFAULT_PORTAL_DIR: &str = "/home/cornerpins/portal";

/// Well-known file locations under the portal directory.
#[derive(Debug, Clone)]
pub struct PortalPaths {
    pub root: PathBuf,
}

impl PortalPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PortalPaths { root: root.into() }
    }

    /// Lane-pair / stream configuration written by the dashboard.
    pub fn streams_config(&self) -> PathBuf {
        self.root.join("streams_config.json")
    }

    /// Ad metadata maintained by the upload form.
    pub fn ads_metadata(&self) -> PathBuf {
        self.root.join("ads").join("ads_metadata.json")
    }

    /// Directory holding the uploaded ad media files.
    pub fn ads_dir(&self) -> PathBuf {
        self.root.join("ads")
    }

    /// Break-timing configuration (TEAM/CUP parameters).
    pub fn ads_config(&self) -> PathBuf {
        self.root.join("ads_config.json")
    }

    /// Append-only playback log (one JSON object per line).
    pub fn playback_log(&self) -> PathBuf {
        self.root.join("logs").join("ad_playback_log.jsonl")
    }
}

impl Default for PortalPaths {
    fn default() -> Self {
        PortalPaths::new(DEFAULT_PORTAL_DIR)
    }
}

// --- Stream configuration ---

/// Top-level stream configuration: one entry per lane pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamsConfig {
    #[serde(default)]
    pub lane_pairs: Vec<LanePair>,
    /// Connection details for the production tool's websocket.
    #[serde(default)]
    pub obs: ObsSettings,
}

impl StreamsConfig {
    /// Load from JSON. Missing or corrupt files yield an empty config
    /// rather than an error; the dashboard owns the file.
    pub fn load(path: &Path) -> Self {
        load_json_or_default(path)
    }
}

/// Two adjacent lanes broadcast as one unit with a shared scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanePair {
    /// Scene/stream name, e.g. "1&2".
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// Scoring provider for this pair. Only "livescores" pages can be
    /// polled for match progress.
    #[serde(default = "default_scoring_type")]
    pub scoring_type: String,
    #[serde(default)]
    pub odd_lane_scoring_source: String,
    #[serde(default)]
    pub even_lane_scoring_source: String,
}

fn default_scoring_type() -> String {
    "livescores".to_string()
}

impl LanePair {
    /// Whether this pair's scoring source supports live polling.
    pub fn is_live_scoring(&self) -> bool {
        self.scoring_type.eq_ignore_ascii_case("livescores")
    }
}

/// obs-websocket connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObsSettings {
    #[serde(default = "default_obs_host")]
    pub host: String,
    #[serde(default = "default_obs_port")]
    pub port: u16,
    #[serde(default)]
    pub password: String,
}

fn default_obs_host() -> String {
    "localhost".to_string()
}

fn default_obs_port() -> u16 {
    4455
}

impl Default for ObsSettings {
    fn default() -> Self {
        ObsSettings {
            host: default_obs_host(),
            port: default_obs_port(),
            password: String::new(),
        }
    }
}

// --- JSON helpers ---

/// Load JSON from a file, returning a default value on missing/corrupt files.
pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Corrupt JSON in {}, using defaults: {}", path.display(), e);
                T::default()
            }
        },
        Err(_) => T::default(),
    }
}

/// Save a value as JSON, creating parent directories as needed.
pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("Create dir error: {}", e))?;
    }
    let json = serde_json::to_string_pretty(data).map_err(|e| format!("Serialize error: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Write error: {}", e))
}
