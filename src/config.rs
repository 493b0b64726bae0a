// Configuration management for route-snapshot
// Supports CLI arguments, config file (TOML), and environment variables

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

use crate::error::AppError;
use crate::routes::arp_text::LINUX_ARP_TABLE;
use crate::routes::proc_route::LINUX_ROUTE_TABLE;

/// route-snapshot - Print the host routing table and ARP cache as uniform rows
#[derive(Parser, Debug, Clone)]
#[command(name = "route-snapshot")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Table to snapshot
    #[arg(value_enum, default_value = "all")]
    pub table: TableKind,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", env = "RSNAP_FORMAT")]
    pub format: OutputFormat,

    /// Serve snapshots over HTTP instead of printing one
    #[arg(long, env = "RSNAP_SERVE")]
    pub serve: bool,

    /// Web server port
    #[arg(short, long, env = "RSNAP_PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RSNAP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "RSNAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// ARP table file (Linux)
    #[arg(long, env = "RSNAP_ARP_PATH")]
    pub arp_path: Option<PathBuf>,

    /// Routing table file (Linux)
    #[arg(long, env = "RSNAP_ROUTE_PATH")]
    pub route_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableKind {
    Routes,
    Arp,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Table source settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// ARP table file
    #[serde(default = "default_arp_path")]
    pub arp_path: PathBuf,

    /// Routing table file
    #[serde(default = "default_route_path")]
    pub route_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Web server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default: 127.0.0.1)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_arp_path() -> PathBuf {
    PathBuf::from(LINUX_ARP_TABLE)
}
fn default_route_path() -> PathBuf {
    PathBuf::from(LINUX_ROUTE_TABLE)
}
fn default_port() -> u16 {
    8080
}
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            arp_path: default_arp_path(),
            route_path: default_route_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Files the text decoders read on Linux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub arp_path: PathBuf,
    pub route_path: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        let sources = SourcesConfig::default();
        SourcePaths {
            arp_path: sources.arp_path,
            route_path: sources.route_path,
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub table: TableKind,
    pub format: OutputFormat,
    pub serve: bool,
    pub port: u16,
    pub bind_address: String,
    pub log_level: Level,
    pub paths: SourcePaths,
    /// Config file that was loaded, if any
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> anyhow::Result<Self> {
        let cli_args = CliArgs::parse();

        let (config_file, config_path) = if let Some(config_path) = &cli_args.config {
            let config_content = std::fs::read_to_string(config_path)?;
            (
                toml::from_str::<ConfigFile>(&config_content)?,
                Some(config_path.clone()),
            )
        } else {
            // Try loading from default locations
            let default_paths = vec![
                PathBuf::from("route-snapshot.toml"),
                PathBuf::from("config.toml"),
            ];

            let mut loaded = (ConfigFile::default(), None);
            for path in default_paths {
                if path.exists() {
                    let config_content = std::fs::read_to_string(&path)?;
                    loaded = (toml::from_str::<ConfigFile>(&config_content)?, Some(path));
                    break;
                }
            }
            loaded
        };

        let mut config = Config::merge(cli_args, config_file)?;
        config.config_file = config_path;
        Ok(config)
    }

    /// Merge parsed CLI args over a config file (CLI args win).
    pub fn merge(cli_args: CliArgs, config_file: ConfigFile) -> Result<Self, AppError> {
        let log_level = parse_log_level(
            cli_args
                .log_level
                .as_deref()
                .unwrap_or(&config_file.logging.level),
        )?;

        Ok(Config {
            table: cli_args.table,
            format: cli_args.format,
            serve: cli_args.serve,
            port: cli_args.port.unwrap_or(config_file.server.port),
            bind_address: config_file.server.bind_address,
            log_level,
            paths: SourcePaths {
                arp_path: cli_args.arp_path.unwrap_or(config_file.sources.arp_path),
                route_path: cli_args.route_path.unwrap_or(config_file.sources.route_path),
            },
            config_file: None,
        })
    }
}

fn parse_log_level(level_str: &str) -> Result<Level, AppError> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(AppError::Config(format!("Invalid log level: {}", level_str))),
    }
}
