use clap::Parser;
use eyre::{Context, Result, eyre};
use hitlist_export::utils::DEFAULT_ANCHOR;
use hitlist_export::{ExportConfig, ExportFormat, sequential};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Export a The Hit List library to a folder tree of JSON or Markdown files.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the library database (library.sqlite3 inside the .thllibrary bundle).
    #[arg(value_name = "DB_PATH")]
    db_path: PathBuf,

    /// Directory to export into. Must not exist yet.
    #[arg(value_name = "TARGET_DIR")]
    target_dir: PathBuf,

    /// Write Markdown checklists instead of JSON.
    #[arg(short, long)]
    markdown: bool,

    /// Title of the top-level group holding all folders.
    /// Defaults to "Folders"; set it for localized libraries.
    #[arg(long, value_name = "TITLE")]
    anchor: Option<String>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/hitlist-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read the database file directly instead of a temporary snapshot.
    #[arg(long)]
    no_snapshot: bool,

    /// Log every folder and list as it is written.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    markdown: Option<bool>,
    anchor: Option<String>,
    snapshot: Option<bool>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("hitlist-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Usage errors exit with 1; --help and --version with 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose, cli.quiet);

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve options (CLI > Config > Default)
    let format = if cli.markdown || file_cfg.markdown.unwrap_or(false) {
        ExportFormat::Markdown
    } else {
        ExportFormat::Json
    };
    let anchor = cli
        .anchor
        .or(file_cfg.anchor)
        .unwrap_or_else(|| DEFAULT_ANCHOR.to_string());
    let snapshot = !cli.no_snapshot && file_cfg.snapshot.unwrap_or(true);

    let config = ExportConfig {
        target_dir: cli.target_dir,
        db_path: cli.db_path,
        format,
        anchor,
        snapshot,
        quiet: cli.quiet,
    };

    // 3. Run the export
    let summary = sequential::execute(&config)?;

    if !config.quiet {
        eprintln!("{}", summary);
    }
    Ok(())
}
