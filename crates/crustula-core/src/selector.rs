//! Jar scoring and per-domain selection.
//!
//! Every jar gets a [`JarStats`] summary of its call history. Jars are ranked
//! by `(recent_success, last_used, strikes)` descending: a jar whose last
//! call worked beats one whose last call failed, then fresher beats older,
//! then fewer failures beats more. The winner is handed out unless its last
//! call failed and it has more than [`SelectionPolicy::max_strikes`] failures.
//!
//! Both the threshold and the "unreported counts as success" rule are
//! heuristics, kept as-is until there is usage data to tune them.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Call, Jar, JarWithCalls};

/// Failures tolerated on a jar whose most recent call failed.
pub const DEFAULT_MAX_STRIKES: u32 = 2;

/// Ranking summary of one jar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JarStats {
    /// Outcome of the most recent call; unreported calls count as success.
    pub recent_success: bool,
    /// Timestamp of the most recent call, or the jar's creation time.
    pub last_used: DateTime<Utc>,
    /// Negated number of calls explicitly reported as failed.
    pub strikes: i64,
}

impl JarStats {
    fn rank_key(&self) -> (bool, DateTime<Utc>, i64) {
        (self.recent_success, self.last_used, self.strikes)
    }
}

/// Summarize `jar`'s call history.
///
/// A jar with no calls is assumed healthy: `(true, jar.ctime, 0)`.
pub fn jar_stats(jar: &Jar, calls: &[Call]) -> JarStats {
    // Earliest position wins among equal timestamps.
    let most_recent = calls
        .iter()
        .reduce(|best, c| if c.timestamp > best.timestamp { c } else { best });

    match most_recent {
        None => JarStats {
            recent_success: true,
            last_used: jar.ctime,
            strikes: 0,
        },
        Some(recent) => {
            let failures = calls.iter().filter(|c| c.success == Some(false)).count();
            JarStats {
                recent_success: recent.success.unwrap_or(true),
                last_used: recent.timestamp,
                strikes: -(failures as i64),
            }
        }
    }
}

/// Tunable part of the selection decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub max_strikes: u32,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_strikes: DEFAULT_MAX_STRIKES,
        }
    }
}

impl SelectionPolicy {
    /// Whether the top-ranked jar is still unfit to hand out.
    pub fn rejects(&self, stats: &JarStats) -> bool {
        !stats.recent_success && stats.strikes < -i64::from(self.max_strikes)
    }
}

/// Rank all jars of a domain, best first.
///
/// The sort is stable, so jars with identical stats keep their input order.
pub fn rank_jars(jars: &[JarWithCalls]) -> Vec<(JarStats, &JarWithCalls)> {
    let mut ranked: Vec<(JarStats, &JarWithCalls)> = jars
        .iter()
        .map(|j| (jar_stats(&j.jar, &j.calls), j))
        .collect();
    ranked.sort_by_key(|(stats, _)| Reverse(stats.rank_key()));
    ranked
}

/// Pick the jar to hand out for a domain, if any is usable.
pub fn select_jar<'a>(
    jars: &'a [JarWithCalls],
    policy: &SelectionPolicy,
) -> Option<&'a JarWithCalls> {
    let (stats, best) = rank_jars(jars).into_iter().next()?;
    if policy.rejects(&stats) {
        return None;
    }
    Some(best)
}
