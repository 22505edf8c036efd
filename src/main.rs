use clap::{Parser, Subcommand};
use log::info;
use std::{path::PathBuf, sync::Arc};
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_default_level, set_log_file,
};

use crate::{
    app::App,
    config::ConfigManager,
    metrics::{Collector, SysinfoProbe},
    monitor::Monitor,
    server::ServerState,
};

pub mod app;
pub mod config;
pub mod event;
pub mod history;
pub mod metrics;
pub mod monitor;
pub mod recording;
pub mod report;
pub mod resample;
pub mod server;
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
    /// Show the live terminal dashboard
    Run,
    /// Serve the HTTP and WebSocket API
    Serve {
        /// Address to listen on, overriding `server.bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Validate the configuration and print the effective settings
    Validate,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Validate) => {
            let config = ConfigManager::load(cli.config)?.current();
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Commands::Serve { bind }) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
            let config = ConfigManager::load(cli.config)?.current();
            let collector =
                Collector::new(SysinfoProbe::new()).with_top_processes(config.top_processes);
            let state = ServerState {
                monitor: Arc::new(Monitor::new(collector, &config.recording)),
                sample_interval: config.sample_interval(),
                download_name: config.server.download_name.clone(),
            };
            let bind = bind.unwrap_or(config.server.bind);
            server::serve(&bind, state).await
        }
        Some(Commands::Run) | None => {
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new("sysmon.log")
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
