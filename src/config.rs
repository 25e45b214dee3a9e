//! Process-wide adapter configuration
//!
//! Resolved once at start-up and threaded into the runtime as an immutable
//! value. Precedence, lowest first: built-in defaults, TOML file, environment,
//! command-line flags (applied by the binary through the `with_*` builders).
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CLI_VISION_PATH` | cli-vision executable | `target/release/cli-vision` |
//! | `VLM_ENDPOINT` / `CLI_VISION_VLM_ENDPOINT` | Vision endpoint passed with `--analyze` | `http://127.0.0.1:8080/v1/chat/completions` |
//! | `CLI_VISION_MCP_DELAY_MS` | Default per-step delay | `150` |
//! | `CLI_VISION_MCP_CAPTURE_TIMEOUT` | Capture wall-clock ceiling (seconds) | `60` |

use crate::errors::{AdapterError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default cli-vision location, relative to the working directory
pub const DEFAULT_EXECUTABLE: &str = "target/release/cli-vision";

/// Default vision-model endpoint
pub const DEFAULT_VLM_ENDPOINT: &str = "http://127.0.0.1:8080/v1/chat/completions";

/// Default delay between inputs (milliseconds)
pub const DEFAULT_DELAY_MS: u64 = 150;

/// Default ceiling for a single capture (seconds)
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 60;

pub const ENV_EXECUTABLE: &str = "CLI_VISION_PATH";
pub const ENV_VLM_ENDPOINT: &str = "VLM_ENDPOINT";
pub const ENV_VLM_ENDPOINT_ALT: &str = "CLI_VISION_VLM_ENDPOINT";
pub const ENV_DELAY_MS: &str = "CLI_VISION_MCP_DELAY_MS";
pub const ENV_CAPTURE_TIMEOUT: &str = "CLI_VISION_MCP_CAPTURE_TIMEOUT";

/// Resolved adapter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Path (or bare name on `PATH`) of the cli-vision executable
    pub executable: PathBuf,

    /// Endpoint handed to cli-vision when analysis is requested
    pub vlm_endpoint: String,

    /// Per-step delay used when a session call omits `delay_ms`
    pub default_delay_ms: u64,

    /// Wall-clock ceiling for the capture sub-command
    pub capture_timeout: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            vlm_endpoint: DEFAULT_VLM_ENDPOINT.to_string(),
            default_delay_ms: DEFAULT_DELAY_MS,
            capture_timeout: Duration::from_secs(DEFAULT_CAPTURE_TIMEOUT_SECS),
        }
    }
}

/// On-disk configuration; every key optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub executable: Option<PathBuf>,
    pub vlm_endpoint: Option<String>,
    pub default_delay_ms: Option<u64>,
    pub capture_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// `~/.cli-vision/mcp.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".cli-vision").join("mcp.toml"))
    }

    /// Load and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
            .map_err(|e| AdapterError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

impl AdapterConfig {
    /// Full resolution: defaults, then the file, then the environment.
    ///
    /// An explicit `file` must exist. Without one, the default path is used
    /// only if present.
    pub fn resolve(file: Option<&Path>) -> Result<Self> {
        let file_cfg = match file {
            Some(path) => Some(ConfigFile::load(path)?),
            None => match ConfigFile::default_path() {
                Some(path) if path.is_file() => Some(ConfigFile::load(&path)?),
                _ => None,
            },
        };

        let mut config = Self::default();
        if let Some(file_cfg) = &file_cfg {
            config = config.apply_file(file_cfg);
        }
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay values present in a config file
    pub fn apply_file(mut self, file: &ConfigFile) -> Self {
        if let Some(executable) = &file.executable {
            self.executable = executable.clone();
        }
        if let Some(endpoint) = &file.vlm_endpoint {
            self.vlm_endpoint = endpoint.clone();
        }
        if let Some(delay) = file.default_delay_ms {
            self.default_delay_ms = delay;
        }
        if let Some(secs) = file.capture_timeout_secs {
            self.capture_timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Overlay environment values. `lookup` stands in for `std::env::var`
    /// so tests never touch the real environment.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_EXECUTABLE) {
            self.executable = PathBuf::from(path);
        }
        if let Some(endpoint) = get(ENV_VLM_ENDPOINT).or_else(|| get(ENV_VLM_ENDPOINT_ALT)) {
            self.vlm_endpoint = endpoint;
        }
        if let Some(raw) = get(ENV_DELAY_MS) {
            self.default_delay_ms = raw.trim().parse().map_err(|_| {
                AdapterError::ConfigError(format!("{} must be a non-negative integer, got '{}'", ENV_DELAY_MS, raw))
            })?;
        }
        if let Some(raw) = get(ENV_CAPTURE_TIMEOUT) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AdapterError::ConfigError(format!("{} must be a whole number of seconds, got '{}'", ENV_CAPTURE_TIMEOUT, raw))
            })?;
            self.capture_timeout = Duration::from_secs(secs);
        }

        self.validate()?;
        Ok(self)
    }

    /// Set executable path
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set vision endpoint
    pub fn with_vlm_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.vlm_endpoint = endpoint.into();
        self
    }

    /// Set default per-step delay
    pub fn with_default_delay_ms(mut self, delay_ms: u64) -> Self {
        self.default_delay_ms = delay_ms;
        self
    }

    /// Set capture ceiling
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Reject values that would make every call fail
    pub fn validate(&self) -> Result<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(AdapterError::ConfigError("executable path is empty".to_string()));
        }
        if self.vlm_endpoint.trim().is_empty() {
            return Err(AdapterError::ConfigError("vlm endpoint is empty".to_string()));
        }
        if self.capture_timeout.is_zero() {
            return Err(AdapterError::ConfigError("capture timeout must be positive".to_string()));
        }
        Ok(())
    }
}
