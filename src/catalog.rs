use crate::config::load_json_or_default;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Duration assumed for an ad whose real length cannot be determined.
pub const DEFAULT_AD_DURATION_SECS: f64 = 5.0;

/// Default priority weight for ads uploaded without one.
pub const DEFAULT_PRIORITY: u32 = 5;

// --- Ad metadata ---

/// Media kind of an uploaded ad. Images carry a fixed display duration;
/// video durations are probed from the file at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AdKind {
    Image {
        #[serde(default = "default_image_duration")]
        duration: f64,
    },
    Video,
}

fn default_image_duration() -> f64 {
    DEFAULT_AD_DURATION_SECS
}

/// A single uploaded advertisement. Created by the dashboard's upload
/// form and removed by its delete action; read-only for the watchdog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub name: String,
    /// Filename relative to the ads directory.
    pub filename: String,
    #[serde(flatten)]
    pub kind: AdKind,
    /// Lane-pair names this ad may play on.
    #[serde(default)]
    pub streams: Vec<String>,
    /// Higher weight sorts earlier in the weighted shuffle.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

impl Ad {
    /// Whether this ad may play on the given lane pair.
    pub fn eligible_for(&self, pair_name: &str) -> bool {
        self.streams.iter().any(|s| s == pair_name)
    }
}

/// Load the ad metadata list. Missing/corrupt files degrade to an
/// empty catalog; the watchdog then simply has nothing to insert.
pub fn load_ads(path: &Path) -> Vec<Ad> {
    load_json_or_default(path)
}

// --- Playback-mode configuration ---

/// Event format selecting which break-timing parameter set applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    #[default]
    #[serde(rename = "TEAM", alias = "team", alias = "Team")]
    Team,
    #[serde(rename = "CUP", alias = "cup", alias = "Cup")]
    Cup,
}

/// Break timings for TEAM events (two breaks per match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamParams {
    #[serde(default = "default_halfway_duration")]
    pub halfway_duration: f64,
    #[serde(default = "default_lane_change_delay")]
    pub lane_change_delay: f64,
    #[serde(default = "default_long_break_duration")]
    pub lane_change_duration: f64,
}

impl Default for TeamParams {
    fn default() -> Self {
        TeamParams {
            halfway_duration: default_halfway_duration(),
            lane_change_delay: default_lane_change_delay(),
            lane_change_duration: default_long_break_duration(),
        }
    }
}

/// Break timings for CUP events (per-game breaks plus a final break).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CupParams {
    #[serde(default = "default_halfway_duration")]
    pub halfway_duration: f64,
    #[serde(default = "default_halfway_duration")]
    pub game_change_duration: f64,
    #[serde(default = "default_final_game_delay")]
    pub final_game_delay: f64,
    #[serde(default = "default_long_break_duration")]
    pub final_game_duration: f64,
}

impl Default for CupParams {
    fn default() -> Self {
        CupParams {
            halfway_duration: default_halfway_duration(),
            game_change_duration: default_halfway_duration(),
            final_game_delay: default_final_game_delay(),
            final_game_duration: default_long_break_duration(),
        }
    }
}

fn default_halfway_duration() -> f64 {
    30.0
}

fn default_lane_change_delay() -> f64 {
    30.0
}

fn default_long_break_duration() -> f64 {
    180.0
}

fn default_final_game_delay() -> f64 {
    15.0
}

/// Venue-wide ad playback configuration, loaded once per watchdog run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdsConfig {
    #[serde(default)]
    pub mode: PlaybackMode,
    #[serde(default)]
    pub team: TeamParams,
    #[serde(default)]
    pub cup: CupParams,
}

impl AdsConfig {
    /// Load from JSON, degrading to TEAM defaults if the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        load_json_or_default(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ad_parses_with_duration() {
        let json = r#"{
            "id": "a1", "name": "Pro Shop", "filename": "proshop.png",
            "type": "Image", "duration": 12.0, "streams": ["1&2"], "priority": 8
        }"#;
        let ad: Ad = serde_json::from_str(json).unwrap();
        assert_eq!(ad.kind, AdKind::Image { duration: 12.0 });
        assert_eq!(ad.priority, 8);
        assert!(ad.eligible_for("1&2"));
        assert!(!ad.eligible_for("3&4"));
    }

    #[test]
    fn image_ad_missing_duration_defaults_to_five() {
        let json = r#"{"id": "a1", "name": "X", "filename": "x.png", "type": "Image"}"#;
        let ad: Ad = serde_json::from_str(json).unwrap();
        assert_eq!(ad.kind, AdKind::Image { duration: 5.0 });
    }

    #[test]
    fn video_ad_parses_without_duration() {
        let json = r#"{"id": "v1", "name": "Burger", "filename": "burger.mp4", "type": "Video"}"#;
        let ad: Ad = serde_json::from_str(json).unwrap();
        assert_eq!(ad.kind, AdKind::Video);
        assert_eq!(ad.priority, DEFAULT_PRIORITY);
        assert!(ad.streams.is_empty());
    }

    #[test]
    fn ad_serialization_roundtrip() {
        let ad = Ad {
            id: "a2".into(),
            name: "Lane Bar".into(),
            filename: "bar.mp4".into(),
            kind: AdKind::Video,
            streams: vec!["1&2".into(), "3&4".into()],
            priority: 3,
        };
        let json = serde_json::to_string(&ad).unwrap();
        let loaded: Ad = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, ad);
    }

    #[test]
    fn load_ads_missing_file_yields_empty() {
        assert!(load_ads(Path::new("/nonexistent/ads_metadata.json")).is_empty());
    }

    #[test]
    fn mode_parses_uppercase_tags() {
        let cfg: AdsConfig = serde_json::from_str(r#"{"mode": "CUP"}"#).unwrap();
        assert_eq!(cfg.mode, PlaybackMode::Cup);
        let cfg: AdsConfig = serde_json::from_str(r#"{"mode": "team"}"#).unwrap();
        assert_eq!(cfg.mode, PlaybackMode::Team);
    }

    #[test]
    fn ads_config_defaults_match_event_timings() {
        let cfg = AdsConfig::default();
        assert_eq!(cfg.mode, PlaybackMode::Team);
        assert_eq!(cfg.team.halfway_duration, 30.0);
        assert_eq!(cfg.team.lane_change_delay, 30.0);
        assert_eq!(cfg.team.lane_change_duration, 180.0);
        assert_eq!(cfg.cup.game_change_duration, 30.0);
        assert_eq!(cfg.cup.final_game_delay, 15.0);
        assert_eq!(cfg.cup.final_game_duration, 180.0);
    }

    #[test]
    fn partial_ads_config_fills_remaining_defaults() {
        let cfg: AdsConfig =
            serde_json::from_str(r#"{"mode": "CUP", "cup": {"halfway_duration": 45}}"#).unwrap();
        assert_eq!(cfg.cup.halfway_duration, 45.0);
        assert_eq!(cfg.cup.final_game_duration, 180.0);
        assert_eq!(cfg.team.halfway_duration, 30.0);
    }
}
