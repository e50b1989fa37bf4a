//! QueryPad - A terminal SQL scratchpad.
//!
//! # Usage
//!
//! ```bash
//! querypad
//! querypad report.sql --database app.db
//! querypad --theme light --font-size 16 --no-wrap
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use querypad::app::App;
use querypad::config::{global_config_path, load_config, ConfigFile, ThemeName};
use querypad_exec::SqliteRunner;
use querypad_ui::Clipboard;

/// An embeddable SQL editor with a terminal host
#[derive(Parser, Debug)]
#[command(name = "querypad", version, about, long_about = None)]
struct Cli {
    /// SQL file to edit (created on save)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Editor font size
    #[arg(long, value_name = "N")]
    font_size: Option<f32>,

    /// Colour theme
    #[arg(long, value_enum)]
    theme: Option<ThemeName>,

    /// Disable soft line wrapping
    #[arg(long)]
    no_wrap: bool,

    /// SQLite database file (in-memory when omitted)
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Where to write logs
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigFile {
        ConfigFile {
            font_size: self.font_size,
            theme: self.theme,
            line_wrapping: self.no_wrap.then_some(false),
            database: self.database.clone(),
            log_file: self.log_file.clone(),
            max_rows: None,
        }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(global_config_path);
    let settings = load_config(&config_path)?
        .merge(&cli.overrides())
        .into_settings();

    init_logging(&settings.log_file)?;
    log::info!("Starting QueryPad");

    let text = match &cli.file {
        Some(path) if path.exists() => {
            log::info!("Opening file: {}", path.display());
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        _ => String::new(),
    };

    let mut runner = match &settings.database {
        Some(path) => SqliteRunner::open(path),
        None => SqliteRunner::open_in_memory(),
    }
    .context("Failed to open database")?;
    runner.set_max_rows(settings.max_rows);

    let mut app = App::new(&settings, cli.file, text, runner, Clipboard::new());
    let result = app.run();

    log::info!("QueryPad exited");
    result
}
