//! Optional TOML configuration, layered under command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::cli::Cli;
use crate::hasher::DEFAULT_CHUNK_SIZE;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dupfinder.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub threads: Option<usize>,
    pub chunk_size: Option<usize>,
    pub follow_links: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub progress: Option<bool>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: '{}'", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("In config file: '{}'", path.display()))
    }

    /// Explicit path if given, otherwise [`DEFAULT_CONFIG_FILE`] when present,
    /// otherwise defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            debug!("Using config file '{}'", fallback.display());
            return Self::load(fallback);
        }
        Ok(Self::default())
    }
}

/// Effective settings after layering CLI flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub threads: usize,
    pub chunk_size: usize,
    pub follow_links: bool,
    pub output_dir: PathBuf,
    pub progress: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Self {
        let threads = cli
            .threads
            .or(config.threads)
            .unwrap_or_else(default_threads)
            .max(1);
        Self {
            threads,
            chunk_size: cli
                .chunk_size
                .or(config.chunk_size)
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            follow_links: cli.follow_links || config.follow_links.unwrap_or(false),
            output_dir: cli
                .output_dir
                .clone()
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            progress: !cli.no_progress && !cli.json && config.progress.unwrap_or(true),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_partial_config() {
        let config = Config::from_toml("threads = 3\nfollow_links = true\n").unwrap();
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.follow_links, Some(true));
        assert_eq!(config.chunk_size, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_toml("thread = 3").is_err());
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from(["dupfinder", "-d", "x", "-t", "2", "--chunk-size", "512"]);
        let config = Config {
            threads: Some(8),
            chunk_size: Some(1024),
            output_dir: Some(PathBuf::from("reports")),
            ..Config::default()
        };
        let settings = Settings::resolve(&cli, config);
        assert_eq!(settings.threads, 2);
        assert_eq!(settings.chunk_size, 512);
        assert_eq!(settings.output_dir, PathBuf::from("reports"));
        assert!(!settings.follow_links);
    }

    #[test]
    fn zero_values_fall_back() {
        let cli = Cli::parse_from(["dupfinder", "-d", "x", "-t", "0", "--chunk-size", "0"]);
        let settings = Settings::resolve(&cli, Config::default());
        assert_eq!(settings.threads, 1);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn json_output_disables_progress() {
        let cli = Cli::parse_from(["dupfinder", "-d", "x", "--json"]);
        assert!(!Settings::resolve(&cli, Config::default()).progress);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("none.toml")).unwrap_err();
        assert!(err.to_string().contains("none.toml"));
    }
}
