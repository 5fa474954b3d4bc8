//! # hitlist-export
//!
//! A CLI tool that exports a task library of The Hit List to a directory tree of plain files.
//!
//! ## What it does
//!
//! The Hit List stores folders, lists and (nested) tasks in a Core Data SQLite database
//! (`library.sqlite3`). This tool walks every folder under the top-level `Folders` group,
//! creates one directory per folder and writes one file per list: pretty-printed JSON by
//! default, or a Markdown checklist with `--markdown`.
//!
//! The database is opened **read-only**, from a snapshot copy by default. Your data is
//! never modified.
//!
//! ## Usage
//!
//! ```sh
//! # JSON export
//! hitlist-export "~/Library/.../The Hit List Library.thllibrary/library.sqlite3" ~/hitlist-backup
//!
//! # Markdown checklists, German library
//! hitlist-export library.sqlite3 ~/hitlist-md --markdown --anchor Ordner
//! ```
//!
//! The destination directory must not exist yet.
//!
//! Preferences can be persisted in `~/.config/hitlist-export/config.toml`.
pub mod exporter;
pub mod importer;
pub mod sequential;
pub mod tree;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use importer::{Group, GroupKind, Library, SchemaVariant, Task};
pub use sequential::{execute, export_library};
pub use tree::{TaskNode, build_task_tree};
pub use utils::{ExportConfig, ExportFormat, ExportSummary, safe_name};
