use crate::ad_log::{PlaybackEvent, PlaybackLog};
use crate::config::ObsSettings;
use crate::obs::ObsClient;
use crate::selector::PlannedAd;
use crate::watchdog::Trigger;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

/// Sink for a triggered break. The watchdog hands over the chosen ads
/// and moves on; playback problems stay inside the sink.
pub trait BreakSink {
    /// Play the given ads in order on the pair's scene.
    fn play(&mut self, pair_name: &str, ads: &[PlannedAd], trigger: Trigger);
}

/// Production sink: inserts each ad into the pair's OBS scene as an
/// `ffmpeg_source`, waits out its duration, then removes it.
///
/// A fresh connection per ad keeps a dropped websocket from wedging
/// the rest of the break. Every ad is recorded in the playback log,
/// including ones whose insertion failed; a partially-failed break
/// still counts as fired.
pub struct ObsSink {
    settings: ObsSettings,
    ads_dir: PathBuf,
    log: PlaybackLog,
}

impl ObsSink {
    pub fn new(settings: ObsSettings, ads_dir: impl Into<PathBuf>, log: PlaybackLog) -> Self {
        ObsSink {
            settings,
            ads_dir: ads_dir.into(),
            log,
        }
    }

    fn play_one(&mut self, pair_name: &str, planned: &PlannedAd) -> Result<(), String> {
        let source_name = format!("ad_{}_{}", pair_name, planned.ad.id);
        let file_path = self.ads_dir.join(&planned.ad.filename);

        let mut client = ObsClient::connect(&self.settings)?;
        client.create_input(
            pair_name,
            &source_name,
            "ffmpeg_source",
            json!({
                "local_file": file_path.to_string_lossy(),
                "looping": false,
            }),
        )?;
        client.restart_media(&source_name)?;
        std::thread::sleep(Duration::from_secs_f64(planned.duration_secs.max(0.0)));
        client.remove_input(&source_name)?;
        client.close();
        Ok(())
    }
}

impl BreakSink for ObsSink {
    fn play(&mut self, pair_name: &str, ads: &[PlannedAd], trigger: Trigger) {
        for planned in ads {
            if let Err(e) = self.play_one(pair_name, planned) {
                log::warn!("Failed to play ad {}: {}", planned.ad.name, e);
            }
            self.log.append(&PlaybackEvent::now(
                pair_name,
                &planned.ad.id,
                &planned.ad.name,
                planned.duration_secs,
                trigger.label(),
            ));
        }
    }
}
