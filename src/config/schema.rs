use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::MAX_TEXT_CHARS;
use crate::ledger::LockPolicy;

pub const DEFAULT_SHARE_BASE_URL: &str = "https://2026christmas-yourwish-mywish-elena.streamlit.app";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub wish: WishConfig,
    pub share: ShareConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file; defaults to `wishes_data.json` in the data dir.
    pub path: Option<PathBuf>,
    pub lock_timeout_ms: u64,
    pub lock_retry_ms: u64,
    pub lock_stale_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let policy = LockPolicy::default();
        Self {
            path: None,
            lock_timeout_ms: policy.timeout.as_millis() as u64,
            lock_retry_ms: policy.retry_interval.as_millis() as u64,
            lock_stale_ms: policy.stale_after.as_millis() as u64,
        }
    }
}

impl StoreConfig {
    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            timeout: Duration::from_millis(self.lock_timeout_ms),
            retry_interval: Duration::from_millis(self.lock_retry_ms.max(1)),
            stale_after: Duration::from_millis(self.lock_stale_ms),
        }
    }

    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(crate::paths::store_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WishConfig {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for WishConfig {
    fn default() -> Self {
        Self {
            min_chars: 4,
            max_chars: MAX_TEXT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub base_url: String,
    pub max_text_chars: usize,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            max_text_chars: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_age_days: Some(7),
            retention_max_files: Some(10),
        }
    }
}

// =============================================================================
// Partial layers (user file, project file)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub store: StoreConfigOverride,
    pub wish: WishConfigOverride,
    pub share: ShareConfigOverride,
    pub logging: LoggingConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, config: &mut Config) {
        self.store.apply_to(&mut config.store);
        self.wish.apply_to(&mut config.wish);
        self.share.apply_to(&mut config.share);
        self.logging.apply_to(&mut config.logging);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfigOverride {
    pub path: Option<PathBuf>,
    pub lock_timeout_ms: Option<u64>,
    pub lock_retry_ms: Option<u64>,
    pub lock_stale_ms: Option<u64>,
}

impl StoreConfigOverride {
    pub fn apply_to(&self, target: &mut StoreConfig) {
        if let Some(path) = self.path.as_ref() {
            target.path = Some(path.clone());
        }
        if let Some(ms) = self.lock_timeout_ms {
            target.lock_timeout_ms = ms;
        }
        if let Some(ms) = self.lock_retry_ms {
            target.lock_retry_ms = ms;
        }
        if let Some(ms) = self.lock_stale_ms {
            target.lock_stale_ms = ms;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WishConfigOverride {
    pub min_chars: Option<usize>,
    pub max_chars: Option<usize>,
}

impl WishConfigOverride {
    pub fn apply_to(&self, target: &mut WishConfig) {
        if let Some(min) = self.min_chars {
            target.min_chars = min;
        }
        if let Some(max) = self.max_chars {
            target.max_chars = max;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShareConfigOverride {
    pub base_url: Option<String>,
    pub max_text_chars: Option<usize>,
}

impl ShareConfigOverride {
    pub fn apply_to(&self, target: &mut ShareConfig) {
        if let Some(url) = self.base_url.as_ref() {
            target.base_url = url.clone();
        }
        if let Some(max) = self.max_text_chars {
            target.max_text_chars = max;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
        if let Some(days) = self.retention_max_age_days {
            target.retention_max_age_days = Some(days);
        }
        if let Some(files) = self.retention_max_files {
            target.retention_max_files = Some(files);
        }
    }
}
