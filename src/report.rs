use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::duplicates::DuplicateGroups;
use crate::scanner::ScanOutcome;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute]");

/// Plain-text report body, one block per group in insertion order.
pub fn render_text(groups: &DuplicateGroups) -> String {
    let mut out = String::from("Duplicate files found:\n");
    for group in groups {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "Hash: {} has {} duplicates:", group.hash, group.paths.len());
        for path in &group.paths {
            let _ = writeln!(out, "\t{}", path.display());
        }
    }
    out
}

/// `YYYYMMDD_HHMM_Duplicates.txt` for the given moment.
pub fn report_file_name(now: OffsetDateTime) -> Result<String> {
    let stamp = now
        .format(TIMESTAMP_FORMAT)
        .context("Failed to format report timestamp")?;
    Ok(format!("{stamp}_Duplicates.txt"))
}

/// Writes the text report into `dir`. Nothing is written when there are no
/// groups.
pub fn write_report(groups: &DuplicateGroups, dir: &Path) -> Result<Option<PathBuf>> {
    if groups.is_empty() {
        debug!("No duplicate groups, skipping report");
        return Ok(None);
    }

    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let path = dir.join(report_file_name(now)?);
    fs::write(&path, render_text(groups))
        .with_context(|| format!("Failed to write report: '{}'", path.display()))?;
    info!("Wrote {} duplicate groups to '{}'", groups.len(), path.display());
    Ok(Some(path))
}

pub fn render_json(outcome: &ScanOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}
