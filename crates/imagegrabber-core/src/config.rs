use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::url_model::FilenamePolicy;

/// File name of the instance gate lock, placed in the system temp dir.
/// Every invocation on the host must agree on it.
pub const LOCK_FILE_NAME: &str = "imagegrabber-sync.lock";

/// Retry parameters for image downloads (optional section in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per image (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds; 0 retries immediately.
    pub delay_ms: u64,
    /// Cap for the doubling delay. Anything below `delay_ms` keeps the delay constant.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 0,
            max_delay_ms: 0,
        }
    }
}

/// HTTP client settings shared by page and image requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout; 0 disables it.
    pub timeout_secs: u64,
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 300,
            follow_redirects: true,
        }
    }
}

/// Run configuration. The defaults reproduce the plain `imagegrabber URL...`
/// behaviour; a file is only read when the user names one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabberConfig {
    pub retry: RetryConfig,
    pub http: HttpConfig,
    /// Overrides the instance gate lock file location.
    pub lock_path: Option<PathBuf>,
    /// Strip traversal and control characters from derived filenames.
    pub sanitize_filenames: bool,
}

impl GrabberConfig {
    /// Lock file used by the instance gate.
    pub fn lock_path(&self) -> PathBuf {
        self.lock_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(LOCK_FILE_NAME))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry.delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms.max(self.retry.delay_ms)),
        }
    }

    pub fn filename_policy(&self) -> FilenamePolicy {
        if self.sanitize_filenames {
            FilenamePolicy::Sanitized
        } else {
            FilenamePolicy::Verbatim
        }
    }
}

/// Load configuration from an explicit TOML file.
pub fn load_from_path(path: &Path) -> Result<GrabberConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: GrabberConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}
