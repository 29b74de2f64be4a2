use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Match progress for one lane, recomputed from scratch every poll.
///
/// `game` and `total_games` are `None` when the page carries no
/// "Game X of Y" text; `frame_counts` holds one completed-frame count
/// per bowler scoreboard found on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneSnapshot {
    pub game: Option<u32>,
    pub total_games: Option<u32>,
    pub frame_counts: Vec<u32>,
}

impl LaneSnapshot {
    /// True when at least one bowler is present and every bowler has
    /// completed `n` or more frames. An empty scoreboard means "no
    /// data" and never satisfies a trigger condition.
    pub fn all_frames_at_least(&self, n: u32) -> bool {
        !self.frame_counts.is_empty() && self.frame_counts.iter().all(|&f| f >= n)
    }
}

fn game_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Game\s*(\d+)\s*of\s*(\d+)").expect("valid regex"))
}

/// Parse a lane's scoring page into a snapshot.
///
/// The markup is third-party and not contractually stable, so this
/// never fails: missing structure degrades to unknown game numbers
/// and an empty bowler list.
pub fn extract_lane_snapshot(html: &str) -> LaneSnapshot {
    let doc = Html::parse_document(html);
    let mut snapshot = LaneSnapshot::default();

    let text: String = doc.root_element().text().collect();
    if let Some(caps) = game_regex().captures(&text) {
        snapshot.game = caps.get(1).and_then(|m| m.as_str().parse().ok());
        snapshot.total_games = caps.get(2).and_then(|m| m.as_str().parse().ok());
    }

    let (Ok(table_sel), Ok(heading_sel), Ok(score_sel)) = (
        Selector::parse("table.scoreboard"),
        Selector::parse("h2"),
        Selector::parse("td.score"),
    ) else {
        return snapshot;
    };

    for table in doc.select(&table_sel) {
        // A heading distinguishes bowler scoreboards from summary tables.
        if table.select(&heading_sel).next().is_none() {
            continue;
        }
        let completed = table
            .select(&score_sel)
            .filter(|cell| {
                let t: String = cell.text().collect();
                let t = t.trim();
                !t.is_empty() && t != "-"
            })
            .count() as u32;
        snapshot.frame_counts.push(completed);
    }

    snapshot
}
