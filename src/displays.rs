//! Display metadata from `system_profiler`.

use std::sync::LazyLock;

use regex::Regex;

use crate::modes::Resolution;
use crate::platform::DisplayQuery;

static RESOLUTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Resolution:\s*(\d+)\s*x\s*(\d+)").expect("valid display regex")
});

/// Resolutions of all displays, in report order.
pub fn parse_display_resolutions(report: &str) -> Vec<Resolution> {
    report
        .lines()
        .filter_map(|line| {
            let caps = RESOLUTION_LINE.captures(line)?;
            Resolution::new(caps[1].parse().ok()?, caps[2].parse().ok()?)
        })
        .collect()
}

/// Best-effort display resolutions; empty if the query fails.
pub fn display_resolutions(query: &dyn DisplayQuery) -> Vec<Resolution> {
    match query.display_report() {
        Ok(report) => parse_display_resolutions(&report),
        Err(e) => {
            log::warn!("Could not read display information: {}", e);
            Vec::new()
        }
    }
}

/// Resolution of display `position`, matched positionally to the report.
///
/// Returns the resolution and whether it is the 1920x1080 stand-in used
/// when the report has no entry for that display.
pub fn resolution_at(resolutions: &[Resolution], position: usize) -> (Resolution, bool) {
    match resolutions.get(position) {
        Some(&resolution) => (resolution, false),
        None => (Resolution::FULL_HD, true),
    }
}
