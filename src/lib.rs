//! lane_watch — Ad-insertion watchdog for bowling-venue live broadcasts.
//!
//! One watchdog process per lane pair polls the pair's scoring pages,
//! infers match progress, and fires advertisement breaks into the pair's
//! production scene at halfway, lane-change, game-change, and final-game
//! trigger points. The CLI consumes this crate.

pub mod ad_log;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod obs;
pub mod playback;
pub mod probe;
pub mod scoreboard;
pub mod selector;
pub mod watchdog;
