use crate::catalog::Ad;
use std::cmp::Ordering;

/// An ad paired with the duration it will occupy on screen, resolved
/// once per break so selection and playback agree.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAd {
    pub ad: Ad,
    pub duration_secs: f64,
}

/// Priority-weighted shuffle: each ad draws a random key scaled down
/// by its priority, then the pool sorts by key. Higher-weight ads
/// tend toward the front, but every ordering remains possible.
pub fn weighted_shuffle(pool: Vec<PlannedAd>) -> Vec<PlannedAd> {
    let mut keyed: Vec<(f64, PlannedAd)> = pool
        .into_iter()
        .map(|p| (fastrand::f64() / f64::from(p.ad.priority.max(1)), p))
        .collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    keyed.into_iter().map(|(_, p)| p).collect()
}

/// Choose ads whose combined runtime covers `target_secs` with minimal
/// overshoot.
///
/// The previously played ad is excluded when any alternative exists,
/// so a break never consists solely of an immediate repeat unless the
/// pool offers nothing else. If no combination reaches the target, the
/// first ad of the pool is returned as a best effort; only a truly
/// empty pool yields an empty list.
///
/// Combination search is exponential in pool size. Eligible pools are
/// small per venue (tens of ads), which keeps this tractable.
pub fn pick_ads_to_fill(
    target_secs: f64,
    pool: &[PlannedAd],
    last_ad_id: Option<&str>,
) -> Vec<PlannedAd> {
    if pool.is_empty() {
        return Vec::new();
    }
    let filtered: Vec<&PlannedAd> = pool
        .iter()
        .filter(|p| last_ad_id != Some(p.ad.id.as_str()))
        .collect();
    let candidates: Vec<&PlannedAd> = if filtered.is_empty() {
        pool.iter().collect()
    } else {
        filtered
    };

    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut current = Vec::new();
    search_combinations(&candidates, 0, 0.0, target_secs, &mut current, &mut best);

    match best {
        Some((indices, _)) => indices.iter().map(|&i| candidates[i].clone()).collect(),
        None => vec![candidates[0].clone()],
    }
}

/// Depth-first combination enumeration in pool order. Extending a
/// combination that already covers the target can only increase the
/// overshoot, so recursion stops at the first qualifying total.
fn search_combinations(
    candidates: &[&PlannedAd],
    start: usize,
    total: f64,
    target: f64,
    current: &mut Vec<usize>,
    best: &mut Option<(Vec<usize>, f64)>,
) {
    for i in start..candidates.len() {
        let with = total + candidates[i].duration_secs;
        current.push(i);
        if with >= target {
            let better = best.as_ref().is_none_or(|(_, t)| with < *t);
            if better {
                *best = Some((current.clone(), with));
            }
        } else {
            search_combinations(candidates, i + 1, with, target, current, best);
        }
        current.pop();
    }
}
