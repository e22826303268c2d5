use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::Fr24Method;
use crate::error::LogoError;
use crate::sources::SourceKind;

pub const DEFAULT_CONFIG_FILE: &str = "airline-logos.json";
pub const DEFAULT_CATALOG_FILE: &str = "airlines.json";
pub const DEFAULT_PLACEHOLDER: &str = "assets/radarbox_placeholder.png";
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_DELAY_SECS: f64 = 0.5;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub delay_secs: Option<f64>,
    #[serde(default)]
    pub skip_existing: Option<bool>,
    #[serde(default)]
    pub fr24_method: Option<Fr24Method>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub catalogs: Option<Vec<String>>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub radarbox_placeholder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub workers: usize,
    pub delay_secs: f64,
    pub skip_existing: bool,
    pub fr24_method: Fr24Method,
    pub output_dir: Utf8PathBuf,
    pub catalogs: Vec<PathBuf>,
    /// Sources named in the file; `None` means "ask" (or all when headless).
    pub sources: Option<Vec<SourceKind>>,
    pub radarbox_placeholder: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the config file. An explicit path must exist; the default file
    /// is optional and falls back to built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, LogoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| LogoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| LogoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, LogoError> {
        let workers = config.workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(LogoError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }

        let delay_secs = config.delay_secs.unwrap_or(DEFAULT_DELAY_SECS);
        delay_duration(delay_secs)?;

        let sources = config
            .sources
            .map(|names| {
                names
                    .iter()
                    .map(|name| name.parse::<SourceKind>())
                    .collect::<Result<Vec<_>, LogoError>>()
            })
            .transpose()?;

        let catalogs = config
            .catalogs
            .unwrap_or_else(|| vec![DEFAULT_CATALOG_FILE.to_string()])
            .into_iter()
            .map(PathBuf::from)
            .collect();

        Ok(ResolvedConfig {
            workers,
            delay_secs,
            skip_existing: config.skip_existing.unwrap_or(false),
            fr24_method: config.fr24_method.unwrap_or_default(),
            output_dir: Utf8PathBuf::from(config.output_dir.unwrap_or_else(|| ".".to_string())),
            catalogs,
            sources,
            radarbox_placeholder: Utf8PathBuf::from(
                config
                    .radarbox_placeholder
                    .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
            ),
        })
    }
}

/// Converts a delay in seconds, rejecting negative, non-finite and
/// out-of-range values.
pub fn delay_duration(secs: f64) -> Result<Duration, LogoError> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        LogoError::InvalidConfig(format!(
            "delay must be a non-negative number of seconds, got {secs}"
        ))
    })
}
