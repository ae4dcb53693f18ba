use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_default_level, set_log_file,
};

use crate::app::App;
use crate::telemetry::{Sampler, ShellProbes};

pub mod app;
pub mod config;
pub mod event;
pub mod resample;
pub mod telemetry;
pub mod tools;
pub mod ui;

#[derive(Parser, Debug)]
#[command(about)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dashboard
    Run,
    /// Validate the configuration file
    Validate,
    /// Poll once and print the snapshot as JSON
    Snapshot,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::Validate) => validate(&cli.config),
        Some(Commands::Snapshot) => snapshot(&cli.config).await,
        Some(Commands::Run) | None => {
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new("vitals.log")
                .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
                .output_file(false)
                .output_separator(':');
            set_log_file(file_options);
            info!("Logging started");
            let mut app = App::new(cli.config)?;
            set_default_level(tui_logger::LevelFilter::Debug);
            let terminal = ratatui::init();
            let result = app.run(terminal).await;
            ratatui::restore();
            result
        }
    }
}

fn validate(path: &Path) -> color_eyre::Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let _config: config::VitalsConfig = toml::from_str(&raw)?;
    println!("{} OK", path.display());
    Ok(())
}

/// Headless one-shot poll for scripting. Polls twice with a short gap so
/// the CPU estimator has a baseline to diff against.
async fn snapshot(path: &Path) -> color_eyre::Result<()> {
    let config = match std::fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)?,
        Err(_) => config::VitalsConfig::default(),
    };
    let mut sampler = Sampler::new(
        ShellProbes::new(config.probe_timeout()),
        config.sampler_settings(),
    );
    sampler.poll().await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let snapshot = sampler.poll().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
