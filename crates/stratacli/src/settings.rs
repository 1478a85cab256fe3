use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use strata_core::config::Config;
use tracing::level_filters::LevelFilter;

/// Looks up keys through a layered cache in front of a slow, simulated origin.
///
/// The origin answers numeric keys with the key plus 89. Keys are normalized before they reach
/// the cache, so `12` and `012` share both cache entries and in-flight lookups. Keys that are not
/// numbers fail to transform.
#[derive(Clone, Parser, Debug)]
#[command(author, version, about, long_about)]
struct Cli {
    /// The keys to look up, all at once.
    pub keys: Vec<String>,

    /// Path to a YAML configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// The severity level of logging output, overriding the configuration file.
    ///
    /// Possible values:
    /// off, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// How long the origin takes to answer a lookup.
    #[arg(long, value_parser = humantime::parse_duration, default_value = "50ms")]
    delay: Duration,

    /// Look up every key this many times, concurrently.
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Disable deduplication of concurrent lookups.
    #[arg(long)]
    no_pooling: bool,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub keys: Vec<String>,
    pub config: Config,
    pub delay: Duration,
    pub repeat: usize,
}

impl Settings {
    pub fn get() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        if cli.keys.is_empty() {
            bail!("No keys provided. Pass at least one key to look up.");
        }
        if cli.repeat == 0 {
            bail!("`--repeat` must be at least 1.");
        }

        let mut config = Config::get(cli.config.as_deref())?;
        if let Some(level) = cli.log_level {
            config.logging.level = level;
        }
        if cli.no_pooling {
            config.pooling = false;
        }

        Ok(Settings {
            keys: cli.keys,
            config,
            delay: cli.delay,
            repeat: cli.repeat,
        })
    }
}
