//! Configuration for the fetch and guess clients.
//!
//! Every setting has a compiled-in default, so both binaries run without
//! arguments. An optional TOML file and command-line flags can override them.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{fetch, guess};

/// Command-line arguments for the stream fetch client
#[derive(Parser, Debug)]
#[command(name = "stream-fetch")]
#[command(version = "0.1.0")]
#[command(about = "Send an identity over TCP and save the reply stream to a file", long_about = None)]
pub struct FetchArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remote endpoint (e.g., 127.0.0.1:2001)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Identity string sent once after connecting
    #[arg(short, long)]
    pub identity: Option<String>,

    /// File the received bytes are written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Receive chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Connect timeout in milliseconds (0 = OS default)
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line arguments for the bisection guess client
#[derive(Parser, Debug)]
#[command(name = "bisect-guess")]
#[command(version = "0.1.0")]
#[command(about = "Guess a number over UDP by bisection", long_about = None)]
pub struct GuessArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Oracle endpoint (e.g., 127.0.0.1:2000)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Lowest candidate value (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub low: Option<i64>,

    /// Highest candidate value (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub high: Option<i64>,

    /// Reply timeout in milliseconds (0 = wait forever)
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Number of times a guess is resent after a timeout
    #[arg(short, long)]
    pub retransmits: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub guess: GuessSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stream fetch configuration
#[derive(Debug, Deserialize)]
pub struct FetchSection {
    #[serde(default = "default_fetch_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_identity")]
    pub identity: String,
    #[serde(default = "default_artifact")]
    pub artifact: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub connect_timeout_ms: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            endpoint: default_fetch_endpoint(),
            identity: default_identity(),
            artifact: default_artifact(),
            chunk_size: default_chunk_size(),
            connect_timeout_ms: 0,
        }
    }
}

/// Bisection guess configuration
#[derive(Debug, Deserialize)]
pub struct GuessSection {
    #[serde(default = "default_guess_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_low")]
    pub low: i64,
    #[serde(default = "default_high")]
    pub high: i64,
    /// Reply timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retransmits")]
    pub retransmits: u32,
}

impl Default for GuessSection {
    fn default() -> Self {
        Self {
            endpoint: default_guess_endpoint(),
            low: default_low(),
            high: default_high(),
            timeout_ms: default_timeout_ms(),
            retransmits: default_retransmits(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_fetch_endpoint() -> String {
    fetch::DEFAULT_ENDPOINT.to_string()
}

fn default_identity() -> String {
    fetch::DEFAULT_IDENTITY.to_string()
}

fn default_artifact() -> PathBuf {
    PathBuf::from(fetch::DEFAULT_ARTIFACT)
}

fn default_chunk_size() -> usize {
    fetch::DEFAULT_CHUNK_SIZE
}

fn default_guess_endpoint() -> String {
    guess::DEFAULT_ENDPOINT.to_string()
}

fn default_low() -> i64 {
    guess::DEFAULT_LOW
}

fn default_high() -> i64 {
    guess::DEFAULT_HIGH
}

fn default_timeout_ms() -> u64 {
    guess::DEFAULT_TIMEOUT_MS
}

fn default_retransmits() -> u32 {
    guess::DEFAULT_RETRANSMITS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration for the stream fetch client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: SocketAddr,
    pub identity: String,
    pub artifact: PathBuf,
    pub chunk_size: usize,
    /// `None` leaves connect blocking until the OS gives up.
    pub connect_timeout: Option<Duration>,
    pub log_level: String,
}

impl FetchConfig {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = FetchArgs::parse();
        let toml_config = read_toml(cli.config.as_deref())?;
        Self::resolve(cli, toml_config)
    }

    /// Merge CLI args over TOML values and validate the result.
    pub fn resolve(cli: FetchArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let section = toml_config.fetch;

        let endpoint = parse_endpoint(&cli.endpoint.unwrap_or(section.endpoint))?;
        let chunk_size = cli.chunk_size.unwrap_or(section.chunk_size);
        if chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be greater than 0".into()));
        }

        Ok(FetchConfig {
            endpoint,
            identity: cli.identity.unwrap_or(section.identity),
            artifact: cli.output.unwrap_or(section.artifact),
            chunk_size,
            connect_timeout: millis(cli.connect_timeout_ms.unwrap_or(section.connect_timeout_ms)),
            log_level: merge_log_level(cli.log_level, toml_config.logging),
        })
    }
}

/// Final resolved configuration for the bisection guess client
#[derive(Debug, Clone)]
pub struct GuessConfig {
    pub endpoint: SocketAddr,
    pub low: i64,
    pub high: i64,
    /// `None` blocks on each reply indefinitely.
    pub timeout: Option<Duration>,
    pub retransmits: u32,
    pub log_level: String,
}

impl GuessConfig {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = GuessArgs::parse();
        let toml_config = read_toml(cli.config.as_deref())?;
        Self::resolve(cli, toml_config)
    }

    /// Merge CLI args over TOML values and validate the result.
    pub fn resolve(cli: GuessArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let section = toml_config.guess;

        let endpoint = parse_endpoint(&cli.endpoint.unwrap_or(section.endpoint))?;
        let low = cli.low.unwrap_or(section.low);
        let high = cli.high.unwrap_or(section.high);
        if low > high {
            return Err(ConfigError::Invalid(format!(
                "search interval is empty: low {low} > high {high}"
            )));
        }

        Ok(GuessConfig {
            endpoint,
            low,
            high,
            timeout: millis(cli.timeout_ms.unwrap_or(section.timeout_ms)),
            retransmits: cli.retransmits.unwrap_or(section.retransmits),
            log_level: merge_log_level(cli.log_level, toml_config.logging),
        })
    }
}

fn read_toml(path: Option<&Path>) -> Result<TomlConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))
}

fn parse_endpoint(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid endpoint '{value}'")))
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn merge_log_level(cli_level: String, logging: LoggingConfig) -> String {
    if cli_level != "info" {
        cli_level
    } else {
        logging.level
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileRead(_, e) => Some(e),
            ConfigError::TomlParse(_, e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
