//! Daemon configuration
//!
//! Read from `CENTROID_*` environment variables, optionally seeded from a
//! `.env` file in the working directory.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "CENTROID_";

const DEFAULT_VIDEO_DIR: &str = "/videos";
const DEFAULT_RESULTS_DIR: &str = "/results";
const DEFAULT_WORKER_PROGRAM: &str = "java";
const DEFAULT_WORKER_JAR: &str = "./processor/videoprocessor.jar";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 3000;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the input videos
    #[serde(default = "default_video_dir")]
    pub video_dir: String,

    /// Directory holding jobs.json and one subdirectory per job
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Public prefix result paths are reported under
    #[serde(default = "default_results_url_prefix")]
    pub results_url_prefix: String,

    /// Executable started once per job
    #[serde(default = "default_worker_program")]
    pub worker_program: String,

    /// Jar passed as `-jar <path>` before the positional arguments.
    /// Empty disables the prefix.
    #[serde(default = "default_worker_jar")]
    pub worker_jar: String,

    /// Kill workers running longer than this. Unset: no limit.
    #[serde(default)]
    pub worker_timeout_secs: Option<u64>,

    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Also write JSON logs to a daily-rotated file in this directory
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_video_dir() -> String {
    DEFAULT_VIDEO_DIR.to_string()
}

fn default_results_dir() -> String {
    DEFAULT_RESULTS_DIR.to_string()
}

fn default_results_url_prefix() -> String {
    centroid_core::application::constants::DEFAULT_RESULTS_URL_PREFIX.to_string()
}

fn default_worker_program() -> String {
    DEFAULT_WORKER_PROGRAM.to_string()
}

fn default_worker_jar() -> String {
    DEFAULT_WORKER_JAR.to_string()
}

fn default_rpc_host() -> String {
    DEFAULT_RPC_HOST.to_string()
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl DaemonConfig {
    /// Load from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from an explicit set of variables
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let config: Self = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("Invalid CENTROID_* configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker_program.trim().is_empty() {
            bail!("{}WORKER_PROGRAM cannot be empty", ENV_PREFIX);
        }
        if self.results_dir.trim().is_empty() {
            bail!("{}RESULTS_DIR cannot be empty", ENV_PREFIX);
        }
        if self.worker_timeout_secs == Some(0) {
            bail!("{}WORKER_TIMEOUT_SECS must be positive", ENV_PREFIX);
        }
        Ok(())
    }

    pub fn video_root(&self) -> PathBuf {
        expand(&self.video_dir)
    }

    pub fn results_root(&self) -> PathBuf {
        expand(&self.results_dir)
    }

    /// Arguments placed before the four positional worker values
    pub fn worker_prefix_args(&self) -> Vec<String> {
        if self.worker_jar.trim().is_empty() {
            return vec![];
        }
        vec![
            "-jar".to_string(),
            expand(&self.worker_jar).display().to_string(),
        ]
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_secs.map(Duration::from_secs)
    }
}
