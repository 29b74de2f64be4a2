use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One fired ad, as recorded in the playback log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    /// UTC timestamp, RFC 3339.
    pub timestamp: String,
    /// Lane-pair / scene name.
    pub stream: String,
    pub ad_id: String,
    pub ad_name: String,
    pub duration: f64,
    /// Trigger label: "halfway", "lane_change", "game_change", "final_game".
    pub trigger: String,
}

impl PlaybackEvent {
    pub fn now(stream: &str, ad_id: &str, ad_name: &str, duration: f64, trigger: &str) -> Self {
        PlaybackEvent {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            stream: stream.to_string(),
            ad_id: ad_id.to_string(),
            ad_name: ad_name.to_string(),
            duration,
            trigger: trigger.to_string(),
        }
    }
}

/// Append-only JSONL record of fired breaks, durable across restarts.
/// The dashboard reads the same file for its audit views.
pub struct PlaybackLog {
    path: PathBuf,
}

impl PlaybackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PlaybackLog { path: path.into() }
    }

    /// Append one event as a single JSON line. Logging must never take
    /// the watchdog down, so I/O failures are logged and swallowed.
    pub fn append(&self, event: &PlaybackEvent) {
        if let Err(e) = self.try_append(event) {
            log::warn!("Failed to record ad playback: {}", e);
        }
    }

    fn try_append(&self, event: &PlaybackEvent) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("Create dir error: {}", e))?;
        }
        let line = serde_json::to_string(event).map_err(|e| format!("Serialize error: {}", e))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| format!("Open error: {}", e))?;
        writeln!(file, "{}", line).map_err(|e| format!("Write error: {}", e))
    }

    /// Read all recorded events, oldest first. Unparseable lines are
    /// skipped so a torn write cannot poison the whole log.
    pub fn read_all(&self) -> Vec<PlaybackEvent> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Per-ad play counts, sorted by count descending then name.
    pub fn play_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for event in self.read_all() {
            *counts.entry(event.ad_name).or_default() += 1;
        }
        let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted
    }

    /// Render the log as CSV for the dashboard's download action.
    pub fn export_csv(&self) -> String {
        let mut out = String::from("timestamp,stream,ad_id,ad_name,duration,trigger\n");
        for event in self.read_all() {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                csv_field(&event.timestamp),
                csv_field(&event.stream),
                csv_field(&event.ad_id),
                csv_field(&event.ad_name),
                event.duration,
                csv_field(&event.trigger),
            ));
        }
        out
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
