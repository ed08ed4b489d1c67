use std::path::PathBuf;

use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, project: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = project {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(raw) = std::env::var("WL_STORE_PATH") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.store.path = Some(PathBuf::from(trimmed));
        }
    }

    if let Ok(raw) = std::env::var("WL_LOCK_TIMEOUT_MS") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            match trimmed.parse::<u64>() {
                Ok(value) => {
                    config.store.lock_timeout_ms = value;
                }
                Err(err) => {
                    tracing::warn!("invalid WL_LOCK_TIMEOUT_MS, ignoring: {err}");
                }
            }
        }
    }

    if let Ok(raw) = std::env::var("WL_SHARE_BASE_URL") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.share.base_url = trimmed.to_string();
        }
    }
}
