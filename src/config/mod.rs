//! Config loading and persistence.

mod load;
mod merge;
mod schema;

pub use load::{
    ConfigError, PROJECT_CONFIG_FILE, config_path, load, load_for_dir, load_or_init,
    load_project_config, project_config_path, write_config,
};
pub use merge::{apply_env_overrides, merge_layers};
pub use schema::{
    Config, ConfigLayer, DEFAULT_SHARE_BASE_URL, FileLoggingConfig, FileLoggingConfigOverride,
    LogFormat, LogRotation, LoggingConfig, LoggingConfigOverride, ShareConfig,
    ShareConfigOverride, StoreConfig, StoreConfigOverride, WishConfig, WishConfigOverride,
};
