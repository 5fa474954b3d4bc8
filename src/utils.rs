use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use rusqlite::{Connection, OpenFlags, backup::Backup};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Seconds between the Unix epoch and the Core Data reference date (2001-01-01T00:00:00Z).
pub const CORE_DATA_EPOCH_OFFSET: f64 = 978_307_200.0;

/// Title of the group that holds every exportable folder in an English library.
pub const DEFAULT_ANCHOR: &str = "Folders";

/// Output flavour for each exported list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub target_dir: PathBuf,
    pub db_path: PathBuf,
    pub format: ExportFormat,
    pub anchor: String,
    pub snapshot: bool,
    pub quiet: bool,
}

impl ExportConfig {
    pub fn new(db_path: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            db_path: db_path.into(),
            format: ExportFormat::default(),
            anchor: DEFAULT_ANCHOR.to_string(),
            snapshot: true,
            quiet: false,
        }
    }
}

/// Counters collected while walking the library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub folders: usize,
    pub lists: usize,
    pub tasks: usize,
    pub failed: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done. {} folders, {} lists, {} tasks exported.",
            self.folders, self.lists, self.tasks
        )?;
        if self.failed > 0 {
            write!(f, " Completed with {} error(s).", self.failed)?;
        }
        Ok(())
    }
}

/// Create a read-only backup of the database to a temporary file.
///
/// The Hit List keeps its library open while running; reading from a copy
/// avoids contending for its locks.
pub fn backup_database(db_path: &Path) -> Result<NamedTempFile> {
    let src = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .wrap_err_with(|| format!("Failed to open source database: {}", db_path.display()))?;

    let tmp = NamedTempFile::new().wrap_err("Failed to create temporary file")?;
    let mut dst =
        Connection::open(tmp.path()).wrap_err("Failed to open snapshot database connection")?;

    {
        let backup = Backup::new(&src, &mut dst).wrap_err("Failed to initialize backup")?;
        backup
            .run_to_completion(1000, Duration::from_millis(5), None)
            .wrap_err("Backup did not complete successfully")?;
    }

    drop(src);
    Ok(tmp)
}

/// Render a Core Data timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn core_data_date(raw: f64) -> Option<String> {
    let unix = raw + CORE_DATA_EPOCH_OFFSET;
    let secs = unix.floor();
    let nanos = ((unix - secs) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Map a folder or list title to a single filesystem-safe path segment.
///
/// Separators become look-alike characters and colons become hyphens.
/// Applying it twice gives the same result as applying it once.
pub fn safe_name(title: &str) -> String {
    let mapped: String = title
        .chars()
        .map(|c| match c {
            '/' => '\u{2215}',
            '\\' => '\u{29F5}',
            ':' => '-',
            other => other,
        })
        .collect();

    if mapped.trim().is_empty() {
        return "Untitled".to_string();
    }
    if mapped.chars().all(|c| c == '.') {
        return mapped.chars().map(|_| '\u{2024}').collect();
    }
    mapped
}
