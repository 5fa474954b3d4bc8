use crate::exporter;
use crate::importer::{Group, GroupKind, Library};
use crate::tree::{TaskNode, build_task_tree, count_tasks};
use crate::utils::{ExportConfig, ExportFormat, ExportSummary, safe_name};
use eyre::{Context, Result, eyre};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, error, info};

/// The main entry point for the export logic.
/// Checks the destination, opens the library and walks it.
pub fn execute(config: &ExportConfig) -> Result<ExportSummary> {
    if config.target_dir.exists() {
        return Err(eyre!(
            "Destination already exists: {}",
            config.target_dir.display()
        ));
    }
    if !config.db_path.is_file() {
        return Err(eyre!("Database not found at: {}", config.db_path.display()));
    }

    let library = if config.snapshot {
        Library::open_snapshot(&config.db_path)?
    } else {
        Library::open(&config.db_path)?
    };
    export_library(&library, config)
}

/// Export every folder under the anchor group into `config.target_dir`.
///
/// The anchor is resolved before anything is created on disk.
pub fn export_library(library: &Library, config: &ExportConfig) -> Result<ExportSummary> {
    let anchor = library.anchor_folder_id(&config.anchor)?;
    let folders = library.child_folders(anchor)?;

    fs::create_dir_all(&config.target_dir).wrap_err_with(|| {
        format!(
            "Failed to create target directory: {}",
            config.target_dir.display()
        )
    })?;

    let mut walker = Walker {
        library,
        format: config.format,
        summary: ExportSummary::default(),
    };
    let mut names = NameRegistry::default();
    for folder in &folders {
        let dir = config.target_dir.join(names.allocate(&folder.title, None));
        walker.export_folder(&dir, folder)?;
    }
    Ok(walker.summary)
}

/// Hands out unique entry names within one output directory.
///
/// Comparison ignores case so the tree survives case-insensitive filesystems.
#[derive(Default)]
struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    fn allocate(&mut self, title: &str, extension: Option<&str>) -> String {
        let stem = safe_name(title);
        let file_name = |stem: &str| match extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem.to_string(),
        };

        let mut candidate = file_name(&stem);
        let mut n = 2;
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = file_name(&format!("{} ({})", stem, n));
            n += 1;
        }
        candidate
    }
}

struct Walker<'a> {
    library: &'a Library,
    format: ExportFormat,
    summary: ExportSummary,
}

impl Walker<'_> {
    fn export_folder(&mut self, dir: &Path, folder: &Group) -> Result<()> {
        info!("Saving lists inside of {} ...", dir.display());
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create directory: {}", dir.display()))?;
        self.summary.folders += 1;

        let mut names = NameRegistry::default();
        for group in self.library.child_groups(folder.id)? {
            match group.kind {
                GroupKind::Folder => {
                    let sub = dir.join(names.allocate(&group.title, None));
                    self.export_folder(&sub, &group)?;
                }
                GroupKind::List => {
                    let path =
                        dir.join(names.allocate(&group.title, Some(self.format.extension())));
                    self.export_list(&path, &group)?;
                }
            }
        }
        Ok(())
    }

    /// Query failures propagate; a failed write only skips this list.
    fn export_list(&mut self, path: &Path, list: &Group) -> Result<()> {
        info!("Exporting {} ...", path.display());
        let tree = build_task_tree(self.library, list.id)?;

        match self.write_list(path, list, &tree) {
            Ok(()) => {
                let tasks = count_tasks(&tree);
                debug!(tasks, "Wrote {}", path.display());
                self.summary.lists += 1;
                self.summary.tasks += tasks;
            }
            Err(e) => {
                error!("Couldn't save '{}': {:#}", path.display(), e);
                self.summary.failed += 1;
            }
        }
        Ok(())
    }

    fn write_list(&self, path: &Path, list: &Group, tree: &[TaskNode]) -> Result<()> {
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        match self.format {
            ExportFormat::Json => {
                exporter::write_json(&mut writer, tree).wrap_err("Failed to write JSON")?
            }
            ExportFormat::Markdown => exporter::write_markdown(&mut writer, &list.title, tree)
                .wrap_err("Failed to write Markdown")?,
        }

        writer.flush().wrap_err("Failed to flush list file")?;
        Ok(())
    }
}
