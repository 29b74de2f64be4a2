use crate::catalog::{Ad, AdsConfig, PlaybackMode};
use crate::config::LanePair;
use crate::fetch::ScoreFetcher;
use crate::playback::BreakSink;
use crate::probe::planned_duration_secs;
use crate::scoreboard::{LaneSnapshot, extract_lane_snapshot};
use crate::selector::{PlannedAd, pick_ads_to_fill, weighted_shuffle};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed interval between poll cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Frames every bowler must have completed for the halfway break.
pub const HALFWAY_FRAMES: u32 = 5;

/// Frames every bowler must have completed for a finished game.
pub const GAME_COMPLETE_FRAMES: u32 = 10;

// --- Trigger points ---

/// Named points in match progress where a break may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Halfway,
    LaneChange,
    GameChange,
    FinalGame,
}

impl Trigger {
    /// Stable label used in the playback log.
    pub fn label(&self) -> &'static str {
        match self {
            Trigger::Halfway => "halfway",
            Trigger::LaneChange => "lane_change",
            Trigger::GameChange => "game_change",
            Trigger::FinalGame => "final_game",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Per-pair break state ---

/// Process-lifetime trigger state for one lane pair.
///
/// The halfway and lane-change/final latches transition false→true at
/// most once and never reset; restarting the watchdog is how a new
/// event begins. `last_game` tracks CUP game transitions (0 recorded
/// when the page carries no game number). `last_ad_id` suppresses an
/// immediate solo repeat of the previous break's closing ad.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakState {
    pub halfway_triggered: bool,
    pub lane_change_triggered: bool,
    pub last_game: Option<u32>,
    pub last_ad_id: Option<String>,
}

/// One break the state machine has decided to fire.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakRequest {
    pub trigger: Trigger,
    /// Wait before the break starts (blocks this pair's loop only).
    pub pre_delay_secs: f64,
    /// Runtime the selected ads should cover.
    pub target_secs: f64,
}

/// Evaluate one poll cycle's trigger conditions.
///
/// Pure with respect to its inputs: latches and the observed game
/// number are updated on `state`, and the breaks to fire are returned
/// in order. Playback and ad selection happen elsewhere.
pub fn evaluate_cycle(
    state: &mut BreakState,
    cfg: &AdsConfig,
    odd: &LaneSnapshot,
    even: &LaneSnapshot,
) -> Vec<BreakRequest> {
    let mut requests = Vec::new();

    let halfway_done = odd.all_frames_at_least(HALFWAY_FRAMES)
        && even.all_frames_at_least(HALFWAY_FRAMES);
    let games_done = odd.all_frames_at_least(GAME_COMPLETE_FRAMES)
        && even.all_frames_at_least(GAME_COMPLETE_FRAMES);

    match cfg.mode {
        PlaybackMode::Team => {
            if !state.halfway_triggered && halfway_done {
                state.halfway_triggered = true;
                requests.push(BreakRequest {
                    trigger: Trigger::Halfway,
                    pre_delay_secs: 0.0,
                    target_secs: cfg.team.halfway_duration,
                });
            }
            if !state.lane_change_triggered && games_done {
                state.lane_change_triggered = true;
                requests.push(BreakRequest {
                    trigger: Trigger::LaneChange,
                    pre_delay_secs: cfg.team.lane_change_delay,
                    target_secs: cfg.team.lane_change_duration,
                });
            }
        }
        PlaybackMode::Cup => {
            // Lanes can disagree mid-transition; take the conservative
            // minimum game and the maximum total. 0 means unknown.
            let game = odd.game.unwrap_or(0).min(even.game.unwrap_or(0));
            let total = odd.total_games.unwrap_or(0).max(even.total_games.unwrap_or(0));

            if !state.halfway_triggered && halfway_done {
                state.halfway_triggered = true;
                requests.push(BreakRequest {
                    trigger: Trigger::Halfway,
                    pre_delay_secs: 0.0,
                    target_secs: cfg.cup.halfway_duration,
                });
            }

            // Not latched: fires on every strict increase of the
            // observed game number.
            if let Some(last) = state.last_game {
                if last > 0 && game > last {
                    requests.push(BreakRequest {
                        trigger: Trigger::GameChange,
                        pre_delay_secs: 0.0,
                        target_secs: cfg.cup.game_change_duration,
                    });
                }
            }

            if !state.lane_change_triggered && total > 0 && game == total && games_done {
                state.lane_change_triggered = true;
                requests.push(BreakRequest {
                    trigger: Trigger::FinalGame,
                    pre_delay_secs: cfg.cup.final_game_delay,
                    target_secs: cfg.cup.final_game_duration,
                });
            }

            state.last_game = Some(game);
        }
    }

    requests
}

// --- The watchdog loop ---

/// Long-lived scheduler for one lane pair.
///
/// Fully isolated from other pairs: each process owns its own state,
/// fetcher, and catalog snapshot. The catalog and mode configuration
/// are loaded once at startup and held for the process lifetime,
/// matching the dashboard's snapshot-at-start expectations.
pub struct Watchdog {
    pair: LanePair,
    cfg: AdsConfig,
    catalog: Vec<Ad>,
    ads_dir: PathBuf,
    fetcher: ScoreFetcher,
    state: BreakState,
}

impl Watchdog {
    pub fn new(
        pair: LanePair,
        cfg: AdsConfig,
        catalog: Vec<Ad>,
        ads_dir: impl Into<PathBuf>,
    ) -> Result<Self, String> {
        Ok(Watchdog {
            pair,
            cfg,
            catalog,
            ads_dir: ads_dir.into(),
            fetcher: ScoreFetcher::new()?,
            state: BreakState::default(),
        })
    }

    pub fn state(&self) -> &BreakState {
        &self.state
    }

    /// Poll until the process is killed. No cycle error is fatal.
    pub fn run(&mut self, sink: &mut dyn BreakSink) -> ! {
        log::info!("Watchdog started for pair {}", self.pair.name);
        loop {
            self.cycle(sink);
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// One poll cycle: fetch, extract, evaluate, fire. Errors are
    /// logged and dropped so the loop retries next interval.
    pub fn cycle(&mut self, sink: &mut dyn BreakSink) {
        if !self.pair.enabled {
            log::info!("{} disabled; sleeping", self.pair.name);
            return;
        }
        if !self.pair.is_live_scoring() {
            log::debug!(
                "{} scoring type '{}' is not pollable; sleeping",
                self.pair.name,
                self.pair.scoring_type
            );
            return;
        }
        if let Err(e) = self.poll_once(sink) {
            log::warn!("Watchdog cycle error for {}: {}", self.pair.name, e);
        }
    }

    fn poll_once(&mut self, sink: &mut dyn BreakSink) -> Result<(), String> {
        let odd_html = self.fetcher.fetch(&self.pair.odd_lane_scoring_source)?;
        let even_html = self.fetcher.fetch(&self.pair.even_lane_scoring_source)?;
        let odd = extract_lane_snapshot(&odd_html);
        let even = extract_lane_snapshot(&even_html);
        self.observe(&odd, &even, sink);
        Ok(())
    }

    /// Feed one pair of snapshots through the state machine and fire
    /// any resulting breaks.
    pub fn observe(&mut self, odd: &LaneSnapshot, even: &LaneSnapshot, sink: &mut dyn BreakSink) {
        let requests = evaluate_cycle(&mut self.state, &self.cfg, odd, even);
        for request in requests {
            self.fire_break(&request, sink);
        }
    }

    /// Execute one decided break: wait out the pre-delay, select ads
    /// for the current pool, play them, and remember the closing ad.
    pub fn fire_break(&mut self, request: &BreakRequest, sink: &mut dyn BreakSink) {
        if request.pre_delay_secs > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(request.pre_delay_secs));
        }

        let pool: Vec<PlannedAd> = self
            .catalog
            .iter()
            .filter(|ad| ad.eligible_for(&self.pair.name))
            .map(|ad| PlannedAd {
                ad: ad.clone(),
                duration_secs: planned_duration_secs(ad, &self.ads_dir),
            })
            .collect();
        let pool = weighted_shuffle(pool);

        let chosen = pick_ads_to_fill(
            request.target_secs,
            &pool,
            self.state.last_ad_id.as_deref(),
        );
        if chosen.is_empty() {
            log::info!(
                "No eligible ads for {} break on {}",
                request.trigger,
                self.pair.name
            );
            return;
        }

        log::info!(
            "Firing {} break on {} with {} ad(s) targeting {}s",
            request.trigger,
            self.pair.name,
            chosen.len(),
            request.target_secs
        );
        sink.play(&self.pair.name, &chosen, request.trigger);

        if let Some(last) = chosen.last() {
            self.state.last_ad_id = Some(last.ad.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CupParams, TeamParams};

    fn snapshot(game: Option<u32>, total: Option<u32>, frames: &[u32]) -> LaneSnapshot {
        LaneSnapshot {
            game,
            total_games: total,
            frame_counts: frames.to_vec(),
        }
    }

    fn team_cfg() -> AdsConfig {
        AdsConfig {
            mode: PlaybackMode::Team,
            team: TeamParams::default(),
            cup: CupParams::default(),
        }
    }

    fn cup_cfg() -> AdsConfig {
        AdsConfig {
            mode: PlaybackMode::Cup,
            ..team_cfg()
        }
    }

    #[test]
    fn team_halfway_fires_once_and_latches() {
        let cfg = team_cfg();
        let mut state = BreakState::default();
        let lane = snapshot(None, None, &[5, 5, 5, 5]);

        let first = evaluate_cycle(&mut state, &cfg, &lane, &lane);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].trigger, Trigger::Halfway);
        assert_eq!(first[0].target_secs, 30.0);
        assert!(state.halfway_triggered);

        let second = evaluate_cycle(&mut state, &cfg, &lane, &lane);
        assert!(second.is_empty());
        assert!(state.halfway_triggered);
    }

    #[test]
    fn team_halfway_needs_both_lanes() {
        let cfg = team_cfg();
        let mut state = BreakState::default();
        let done = snapshot(None, None, &[5, 6]);
        let behind = snapshot(None, None, &[5, 4]);

        assert!(evaluate_cycle(&mut state, &cfg, &done, &behind).is_empty());
        assert!(!state.halfway_triggered);
    }

    #[test]
    fn team_lane_change_carries_delay_and_duration() {
        let cfg = team_cfg();
        let mut state = BreakState::default();
        let lane = snapshot(None, None, &[10, 10, 10]);

        let requests = evaluate_cycle(&mut state, &cfg, &lane, &lane);
        // Frames >= 10 satisfy the halfway condition too.
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].trigger, Trigger::Halfway);
        let lane_change = &requests[1];
        assert_eq!(lane_change.trigger, Trigger::LaneChange);
        assert_eq!(lane_change.pre_delay_secs, 30.0);
        assert_eq!(lane_change.target_secs, 180.0);
        assert!(state.lane_change_triggered);
    }

    #[test]
    fn empty_scoreboard_never_triggers() {
        let cfg = team_cfg();
        let mut state = BreakState::default();
        let empty = LaneSnapshot::default();

        assert!(evaluate_cycle(&mut state, &cfg, &empty, &empty).is_empty());
        assert!(!state.halfway_triggered);
        assert!(!state.lane_change_triggered);
    }

    #[test]
    fn cup_game_change_fires_per_increase() {
        let cfg = cup_cfg();
        let mut state = BreakState::default();

        // First observation records the game without firing.
        let g1 = snapshot(Some(1), Some(3), &[3]);
        assert!(evaluate_cycle(&mut state, &cfg, &g1, &g1).is_empty());
        assert_eq!(state.last_game, Some(1));

        // Game 1 -> 2 fires.
        let g2 = snapshot(Some(2), Some(3), &[1]);
        let requests = evaluate_cycle(&mut state, &cfg, &g2, &g2);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].trigger, Trigger::GameChange);
        assert_eq!(requests[0].target_secs, 30.0);
        assert_eq!(state.last_game, Some(2));

        // Same game again: no fire.
        assert!(evaluate_cycle(&mut state, &cfg, &g2, &g2).is_empty());

        // Game 2 -> 3 fires again; the trigger is not latched.
        let g3 = snapshot(Some(3), Some(3), &[1]);
        assert_eq!(evaluate_cycle(&mut state, &cfg, &g3, &g3).len(), 1);
    }

    #[test]
    fn cup_game_change_ignores_unknown_game_numbers() {
        let cfg = cup_cfg();
        let mut state = BreakState::default();

        let unknown = snapshot(None, None, &[3]);
        assert!(evaluate_cycle(&mut state, &cfg, &unknown, &unknown).is_empty());
        assert_eq!(state.last_game, Some(0));

        // A transition from "unknown" to a real game number must not
        // fire a game-change break.
        let g2 = snapshot(Some(2), Some(3), &[1]);
        assert!(evaluate_cycle(&mut state, &cfg, &g2, &g2).is_empty());
        assert_eq!(state.last_game, Some(2));
    }

    #[test]
    fn cup_uses_min_game_across_lanes() {
        let cfg = cup_cfg();
        let mut state = BreakState {
            last_game: Some(1),
            ..BreakState::default()
        };
        // One lane has moved on; the other has not. min = 1: no fire.
        let ahead = snapshot(Some(2), Some(3), &[1]);
        let behind = snapshot(Some(1), Some(3), &[9]);
        assert!(evaluate_cycle(&mut state, &cfg, &ahead, &behind).is_empty());
        assert_eq!(state.last_game, Some(1));
    }

    #[test]
    fn cup_final_game_break_latches_with_lane_change() {
        let cfg = cup_cfg();
        let mut state = BreakState {
            halfway_triggered: true,
            last_game: Some(3),
            ..BreakState::default()
        };
        let final_done = snapshot(Some(3), Some(3), &[10, 10]);

        let requests = evaluate_cycle(&mut state, &cfg, &final_done, &final_done);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].trigger, Trigger::FinalGame);
        assert_eq!(requests[0].pre_delay_secs, 15.0);
        assert_eq!(requests[0].target_secs, 180.0);
        assert!(state.lane_change_triggered);

        // Latched: identical snapshots never refire.
        assert!(evaluate_cycle(&mut state, &cfg, &final_done, &final_done).is_empty());
    }

    #[test]
    fn cup_final_game_requires_known_totals() {
        let cfg = cup_cfg();
        let mut state = BreakState {
            halfway_triggered: true,
            ..BreakState::default()
        };
        // All frames complete but no "Game X of Y" text anywhere.
        let done = snapshot(None, None, &[10, 10]);
        assert!(evaluate_cycle(&mut state, &cfg, &done, &done).is_empty());
        assert!(!state.lane_change_triggered);
    }

    #[test]
    fn cup_final_game_waits_for_both_lanes_done() {
        let cfg = cup_cfg();
        let mut state = BreakState {
            halfway_triggered: true,
            last_game: Some(3),
            ..BreakState::default()
        };
        let done = snapshot(Some(3), Some(3), &[10, 10]);
        let bowling = snapshot(Some(3), Some(3), &[10, 8]);
        assert!(evaluate_cycle(&mut state, &cfg, &done, &bowling).is_empty());
        assert!(!state.lane_change_triggered);
    }

    #[test]
    fn team_mode_ignores_game_numbers() {
        let cfg = team_cfg();
        let mut state = BreakState {
            last_game: Some(1),
            ..BreakState::default()
        };
        let g2 = snapshot(Some(2), Some(3), &[1]);
        assert!(evaluate_cycle(&mut state, &cfg, &g2, &g2).is_empty());
        // TEAM mode never tracks game numbers.
        assert_eq!(state.last_game, Some(1));
    }

    #[test]
    fn custom_durations_flow_into_requests() {
        let cfg = AdsConfig {
            mode: PlaybackMode::Team,
            team: TeamParams {
                halfway_duration: 45.0,
                lane_change_delay: 10.0,
                lane_change_duration: 120.0,
            },
            cup: CupParams::default(),
        };
        let mut state = BreakState::default();
        let lane = snapshot(None, None, &[5, 5]);
        let requests = evaluate_cycle(&mut state, &cfg, &lane, &lane);
        assert_eq!(requests[0].target_secs, 45.0);
    }
}
