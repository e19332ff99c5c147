//! ndv-linker - Video to milestone association batch tool
//!
//! Subcommands:
//! - `suggest`: rank every video and write a review file
//! - `apply`: apply a (reviewed) association file
//! - `run`: rank and apply in one pass
//!
//! Exit status is non-zero when configuration is invalid or any video failed to
//! apply.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndv_common::config::{ConfigResolver, TomlConfig};
use ndv_linker::{commands, LinkerError, RunReport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Command-line arguments for ndv-linker
#[derive(Parser, Debug)]
#[command(name = "ndv-linker")]
#[command(about = "Associate developmental videos with normative milestones")]
#[command(version)]
struct Cli {
    /// Bootstrap config file (overrides NDV_CONFIG and the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Only match videos with this provenance tag
    #[arg(long)]
    source_tag: Option<String>,

    /// Maximum milestones per video
    #[arg(long)]
    top_k: Option<usize>,

    /// Minimum candidate score
    #[arg(long)]
    min_score: Option<u32>,

    /// Force debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank videos and write a review file
    Suggest {
        #[arg(short, long, default_value = "asociaciones_sugeridas.json")]
        output: PathBuf,
    },
    /// Apply a review file to the database
    Apply {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Rank and apply in one pass
    Run,
}

impl Cli {
    fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(tag) = &self.source_tag {
            config.video_source_tag = Some(tag.clone());
        }
        if let Some(top_k) = self.top_k {
            config.matching.top_k = top_k;
        }
        if let Some(min_score) = self.min_score {
            config.matching.min_score = min_score;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = ConfigResolver::new(cli.config.clone()).load();
    let level = match &loaded {
        Ok(config) => config.logging.level.clone(),
        Err(_) => "info".to_string(),
    };
    init_tracing(&level, cli.verbose);

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    cli.apply_overrides(&mut config);

    let run_id = Uuid::new_v4();
    info!(
        run_id = %run_id,
        "Starting ndv-linker v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Database path: {}", config.database_path.display());

    match cli.command {
        Command::Suggest { output } => {
            commands::suggest(&config, &output)
                .await
                .map_err(report_fatal)?;
            Ok(())
        }
        Command::Apply { input } => {
            let report = commands::apply_review(&config, &input, run_id)
                .await
                .map_err(report_fatal)?;
            finish(report)
        }
        Command::Run => {
            let report = commands::run(&config, run_id)
                .await
                .map_err(report_fatal)?;
            finish(report)
        }
    }
}

fn init_tracing(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn report_fatal(err: LinkerError) -> anyhow::Error {
    match &err {
        LinkerError::Config(e) => error!("Invalid configuration: {}", e),
        other => error!("{}", other),
    }
    err.into()
}

fn finish(report: RunReport) -> Result<()> {
    report.log_summary();
    if !report.is_success() {
        bail!(
            "{} video(s) failed to apply: {:?}",
            report.failed.len(),
            report.failed_video_ids()
        );
    }
    Ok(())
}
