use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Transfer tuning (optional `[transfer]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Connect-phase timeout in seconds. A timed-out connect counts as a
    /// transport failure and is retried. `None` = libcurl default.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Maximum number of redirects followed per request.
    pub max_redirections: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Some(30),
            max_redirections: 10,
        }
    }
}

/// Defaults loaded from `~/.config/batchdl/config.toml`. Command-line flags
/// override these; a loaded checkpoint overrides both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of parallel download workers.
    pub concurrency: usize,
    /// Lines skipped at the top of the input list (header).
    pub skip_lines: usize,
    /// Directory downloads are placed in.
    pub output_dir: PathBuf,
    /// Retries after the first failed attempt (transport errors only).
    pub max_retries: u32,
    /// Pause after each download, per worker, in seconds.
    pub delay_secs: f64,
    /// Progress display refresh period in milliseconds.
    pub progress_interval_ms: u64,
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            skip_lines: 1,
            output_dir: PathBuf::from("downloads"),
            max_retries: 3,
            delay_secs: 1.0,
            progress_interval_ms: 500,
            transfer: TransferConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("batchdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BatchConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Invalid run parameters. Fatal at startup.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("delay per request must be a finite, non-negative number of seconds (got {0})")]
    InvalidDelay(f64),
    #[error("no input list given")]
    MissingInput,
}

/// Parameters of one run. Immutable while the run is in progress; persisted
/// inside a checkpoint so a later run can continue where this one stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub concurrency: usize,
    pub input_path: PathBuf,
    pub skip_lines: usize,
    pub output_dir: PathBuf,
    pub max_retries: u32,
    #[serde(rename = "delayPerRequest")]
    pub delay_secs: f64,
    /// Entries of the input list already resolved by earlier runs.
    #[serde(default)]
    pub resume_offset: u64,
}

impl RunConfig {
    /// Fresh run parameters from the config-file defaults.
    pub fn from_defaults(cfg: &BatchConfig, input_path: PathBuf) -> Self {
        Self {
            concurrency: cfg.concurrency,
            input_path,
            skip_lines: cfg.skip_lines,
            output_dir: cfg.output_dir.clone(),
            max_retries: cfg.max_retries,
            delay_secs: cfg.delay_secs,
            resume_offset: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if !self.delay_secs.is_finite() || self.delay_secs < 0.0 {
            return Err(ConfigError::InvalidDelay(self.delay_secs));
        }
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }
        Ok(())
    }

    /// Per-worker pause between downloads. Invalid values collapse to zero.
    pub fn inter_request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }
}
