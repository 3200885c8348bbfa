//! Hookwatch - live monitor for hook event logs.

use anyhow::Result;
use clap::{ArgGroup, Parser};
use hookwatch_cli::app::{self, Mode, RunOptions};
use hookwatch_cli::{config, logging, terminal};
use hookwatch_core::{MonitorOptions, StatusFilter};
use hookwatch_types::Status;
use std::path::PathBuf;
use std::process::ExitCode;

use config::Config;
use logging::{LogConfig, LogFormat};
use terminal::TermEnv;

/// Hookwatch - follow hook results as they are written.
#[derive(Parser, Debug)]
#[command(name = "hookwatch")]
#[command(about = "Live monitor for hook event logs")]
#[command(version)]
#[command(group(ArgGroup::new("mode").args(["session", "all", "project"])))]
struct Cli {
    /// Session id or unique id prefix (defaults to the most recent session)
    session: Option<String>,

    /// Follow every log in the log directory
    #[arg(long)]
    all: bool,

    /// Follow the logs of one project directory
    #[arg(long, value_name = "PATH")]
    project: Option<PathBuf>,

    /// List sessions instead of following (combine with --project to filter)
    #[arg(long, conflicts_with_all = ["session", "all"])]
    list: bool,

    /// Show agent and script detail under each entry
    #[arg(short, long)]
    verbose: bool,

    /// Only show these statuses (e.g., "FAIL,CRASH")
    #[arg(long, value_name = "STATUSES", value_delimiter = ',')]
    status: Vec<Status>,

    /// Prefix each entry with its session id
    #[arg(long)]
    show_session: bool,

    /// Print existing entries and exit
    #[arg(long)]
    no_follow: bool,

    /// Number of existing entries shown in merged views
    #[arg(long, value_name = "N")]
    lines: Option<usize>,

    /// Override the log directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "tail=debug").
    /// Can be specified multiple times. Targets are prefixed with "hookwatch::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.list {
            Mode::List(self.project.clone())
        } else if self.all {
            Mode::All
        } else if let Some(project) = &self.project {
            Mode::Project(project.clone())
        } else {
            Mode::Session(self.session.clone())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides.clone(),
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env();

    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    if let Some(lines) = cli.lines {
        config.backlog = lines;
    }

    tracing::info!(
        target: "hookwatch::startup",
        "Loaded configuration (log_dir: {})",
        config.log_dir.display()
    );

    let term = TermEnv::detect(cli.no_color, config.fallback_width);
    tracing::debug!(target: "hookwatch::startup", "Terminal: {:?}", term);

    let options = RunOptions {
        mode: cli.mode(),
        monitor: MonitorOptions {
            poll_interval: config.poll_interval(),
            rescan_interval: config.rescan_interval(),
            backlog: config.backlog,
            filter: StatusFilter::new(cli.status.iter().copied()),
            ..MonitorOptions::new(&config.log_dir)
        },
        render: term.render_options(cli.show_session, cli.verbose),
        follow: !cli.no_follow,
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "hookwatch::startup", "Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    app::execute(options, std::io::stdout(), shutdown).await?;
    Ok(())
}
