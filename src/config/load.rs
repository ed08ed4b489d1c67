use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigLayer};

pub const PROJECT_CONFIG_FILE: &str = "wishes.toml";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
}

pub fn load_project_config(dir: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&project_config_path(dir))
}

/// Defaults, then user file, then `./wishes.toml`, then env.
pub fn load() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().ok();
    load_for_dir(cwd.as_deref())
}

pub fn load_for_dir(project_dir: Option<&Path>) -> Result<Config, ConfigError> {
    load_from(&config_path(), project_dir)
}

/// Config for one run of the binary.
///
/// Never fails: a broken layer falls back to defaults plus env overrides,
/// and a default user file is written on first run. Problems are handed
/// back so the caller can report them once logging is up.
pub fn load_or_init() -> (Config, Vec<ConfigError>) {
    let cwd = std::env::current_dir().ok();
    init_at(&config_path(), cwd.as_deref())
}

fn init_at(user_path: &Path, project_dir: Option<&Path>) -> (Config, Vec<ConfigError>) {
    let mut problems = Vec::new();
    let config = match load_from(user_path, project_dir) {
        Ok(config) => config,
        Err(err) => {
            problems.push(err);
            let mut config = Config::default();
            apply_env_overrides(&mut config);
            config
        }
    };

    if !user_path.exists() {
        if let Err(err) = write_config(user_path, &Config::default()) {
            problems.push(err);
        }
    }
    (config, problems)
}

fn load_from(user_path: &Path, project_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let user = read_layer(user_path)?;
    let project = match project_dir {
        Some(dir) => load_project_config(dir)?,
        None => None,
    };
    let mut config = merge_layers(user, project);
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(cfg)?;
    atomic_write(path, contents.as_bytes())
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let write_err = |source: io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    fs::write(temp.path(), data).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
