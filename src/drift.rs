//! Configuration drift: line diff between two snapshots of the same device.
//!
//! The diff is a unified diff with zero context lines, so the sample only
//! ever contains file headers, hunk headers and changed lines. The backing
//! store keeps snapshots at minute granularity, hence [`snapshot_timestamp_ms`].

use similar::udiff::UnifiedHunkHeader;
use similar::{Algorithm, ChangeTag, TextDiff};

use crate::records::DriftSummary;

/// Number of diff lines kept in [`DriftSummary::sample_text`].
pub const SAMPLE_LINES: usize = 20;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;

/// Diff `old_text` (historical snapshot) against `new_text` (current).
pub fn diff_configs(old_text: &str, new_text: &str) -> DriftSummary {
    let old_lines: Vec<&str> = old_text.lines().collect();
    let new_lines: Vec<&str> = new_text.lines().collect();

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(&old_lines[..], &new_lines[..]);

    let mut added_lines = 0;
    let mut removed_lines = 0;
    let mut sample: Vec<String> = Vec::new();

    for group in diff.grouped_ops(0) {
        if sample.is_empty() {
            // Named labels in place of difflib's empty file headers.
            sample.push("--- snapshot".to_string());
            sample.push("+++ current".to_string());
        }
        sample.push(UnifiedHunkHeader::new(&group).to_string());
        for op in &group {
            for change in diff.iter_changes(op) {
                let marker = match change.tag() {
                    ChangeTag::Delete => {
                        removed_lines += 1;
                        '-'
                    }
                    ChangeTag::Insert => {
                        added_lines += 1;
                        '+'
                    }
                    ChangeTag::Equal => continue,
                };
                sample.push(format!("{}{}", marker, change.value()));
            }
        }
    }

    sample.truncate(SAMPLE_LINES);
    DriftSummary {
        added_lines,
        removed_lines,
        sample_text: sample.join("\n"),
    }
}

/// Timestamp of the snapshot `hours_back` hours before `now_ms`, floored to
/// the minute.
pub fn snapshot_timestamp_ms(now_ms: i64, hours_back: u32) -> i64 {
    let past = now_ms - i64::from(hours_back) * HOUR_MS;
    past.div_euclid(MINUTE_MS) * MINUTE_MS
}
