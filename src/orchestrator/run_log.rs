//! Append-only run log shared by every viewer invocation.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

const RULE: &str =
    "##############################################################################";

/// Open the log for appending, creating it if needed. Never truncates.
pub(crate) fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Timestamp for the run banner. Sub-second precision keeps back-to-back runs apart.
pub(crate) fn banner_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

/// Append the separator block that starts a run.
pub(crate) fn write_banner(log: &mut File, timestamp: &str) -> Result<()> {
    let banner = format!(
        "\n\n\n\n\n{:#^78}\n{timestamp}\n{RULE}\n",
        format!("  {}  ", env!("CARGO_PKG_NAME")),
    );
    log.write_all(banner.as_bytes())
        .context("failed to write run banner to log file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banners_accumulate_without_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.log");
        std::fs::write(&path, "earlier output\n").unwrap();

        let mut log = open_log(&path).unwrap();
        write_banner(&mut log, "2024-01-01T00:00:00.1Z").unwrap();
        drop(log);
        let mut log = open_log(&path).unwrap();
        write_banner(&mut log, "2024-01-01T00:00:00.2Z").unwrap();
        drop(log);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("earlier output\n"));
        assert!(text.contains("2024-01-01T00:00:00.1Z"));
        assert!(text.contains("2024-01-01T00:00:00.2Z"));
        assert_eq!(text.matches(RULE).count(), 2);
    }

    #[test]
    fn banner_title_is_ruled_to_full_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.log");
        let mut log = open_log(&path).unwrap();
        write_banner(&mut log, "ts").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let title = text.lines().find(|l| l.contains(env!("CARGO_PKG_NAME"))).unwrap();
        assert_eq!(title.len(), RULE.len());
        assert!(title.starts_with('#') && title.ends_with('#'));
    }

    #[test]
    fn open_log_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_log(&dir.path().join("missing/plot.log")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to open log file"));
    }
}
