use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::model::work_item::NO_ITERATION;
use crate::model::{Release, WorkItem};

pub const UNRELEASED: &str = "Unreleased";

/// Latest production deploy across all releases, e.g. "November 06, 2025".
pub fn extract_release_date(releases: &[Release]) -> String {
    releases
        .iter()
        .filter_map(|r| r.prod_deploy_time.as_deref())
        .filter_map(parse_timestamp)
        .max()
        .map(|latest| latest.format("%B %d, %Y").to_string())
        .unwrap_or_else(|| UNRELEASED.to_string())
}

/// RFC 3339, or an offsetless ISO-8601 timestamp read as UTC.
fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc()))
        .ok()
}

/// Distinct iteration paths, newest (lexically greatest) first.
pub fn extract_iterations(work_items: &[WorkItem]) -> String {
    let iterations: BTreeSet<&str> = work_items
        .iter()
        .map(|item| item.iteration_path.as_str())
        .filter(|path| *path != NO_ITERATION)
        .collect();

    if iterations.is_empty() {
        return NO_ITERATION.to_string();
    }
    iterations.into_iter().rev().collect::<Vec<_>>().join(", ")
}
