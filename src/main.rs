mod config;
mod telemetry;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::config::{Config, ConfigError, SourceConfig};
use crate::telemetry::CircularFlight;

#[derive(Parser)]
#[command(name = "simconnect-proxy")]
#[command(about = "Live aircraft telemetry for moving-map clients")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve telemetry over HTTP
    Serve {
        /// YAML config file
        #[arg(short, long)]
        config: Option<String>,
        /// Address to listen on, overrides the config file
        #[arg(long)]
        bind: Option<String>,
        /// Listen for ForeFlight UDP telemetry on this port
        #[arg(long)]
        foreflight_port: Option<u16>,
    },
    /// Print the demo circular flight as JSON lines
    Simulate {
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long, default_value_t = 10)]
        ticks: usize,
    },
    /// Validate a config file
    Validate { config: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            foreflight_port,
        } => serve(config.as_deref(), bind, foreflight_port),
        Commands::Simulate { config, ticks } => simulate(config.as_deref(), ticks),
        Commands::Validate { config } => validate(&config),
    }
}

fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn serve(path: Option<&str>, bind: Option<String>, foreflight_port: Option<u16>) -> ExitCode {
    let mut config = match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = bind {
        config.web.bind = bind;
    }
    if let Some(port) = foreflight_port {
        config.telemetry.source = SourceConfig::foreflight(port);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn simulate(path: Option<&str>, ticks: usize) -> ExitCode {
    let config = match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for fix in CircularFlight::new(config.simulation).take(ticks) {
        match serde_json::to_string(&fix) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn validate(path: &str) -> ExitCode {
    match Config::from_file(path) {
        Ok(config) => {
            println!("Config is valid");
            println!("  bind: {}", config.web.bind);
            println!("  tick: {}", humantime::format_duration(config.telemetry.tick));
            println!("  on read error: {:?}", config.telemetry.on_read_error);
            match config.telemetry.source {
                SourceConfig::None => println!("  source: none (demo mode)"),
                SourceConfig::ForeFlight { port, stale_after } => println!(
                    "  source: foreflight udp/{} (stale after {})",
                    port,
                    humantime::format_duration(stale_after)
                ),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Config error: {}", e);
            ExitCode::FAILURE
        }
    }
}
