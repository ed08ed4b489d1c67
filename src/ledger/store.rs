//! JSON file holding the whole wish collection.
//!
//! Layout: one top-level object mapping wish id to record. Entries this
//! version cannot read are carried through writes untouched.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::{WallClock, WishId, WishRecord};
use crate::error::Transience;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    records: BTreeMap<WishId, WishRecord>,
    opaque: BTreeMap<String, Value>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &WishId) -> Option<&WishRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &WishId) -> Option<&mut WishRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &WishId) -> bool {
        self.records.contains_key(id)
    }

    pub fn insert(&mut self, id: WishId, record: WishRecord) -> Option<WishRecord> {
        self.opaque.remove(id.as_str());
        self.records.insert(id, record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WishId, &WishRecord)> {
        self.records.iter()
    }

    /// Number of entries kept verbatim because they did not parse.
    pub fn opaque_len(&self) -> usize {
        self.opaque.len()
    }

    fn from_object(object: Map<String, Value>) -> Self {
        let mut collection = Self::new();
        for (key, value) in object {
            let parsed = WishId::parse(&key)
                .ok()
                .filter(|id| id.as_str() == key)
                .and_then(|id| {
                    serde_json::from_value::<WishRecord>(value.clone())
                        .map(|record| (id, record))
                        .map_err(|err| {
                            tracing::warn!(wish_id = %key, error = %err, "skipping unreadable wish record");
                        })
                        .ok()
                });
            match parsed {
                Some((id, record)) => {
                    collection.records.insert(id, record);
                }
                None => {
                    collection.opaque.insert(key, value);
                }
            }
        }
        collection
    }

    fn to_object(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut object = Map::new();
        for (key, value) in &self.opaque {
            object.insert(key.clone(), value.clone());
        }
        for (id, record) in &self.records {
            object.insert(id.as_str().to_string(), serde_json::to_value(record)?);
        }
        Ok(object)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to read store {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store {path:?} does not hold a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write store {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn transience(&self) -> Transience {
        match self {
            StoreError::Read { .. } | StoreError::Write { .. } => Transience::Unknown,
            StoreError::Corrupt { .. } | StoreError::NotAnObject { .. } | StoreError::Encode(_) => {
                Transience::Permanent
            }
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. } | StoreError::NotAnObject { .. })
    }
}

/// The store file. Stateless: every call goes to disk.
#[derive(Clone, Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load. A missing or blank file is an empty collection.
    pub fn try_load(&self) -> Result<Collection, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Collection::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Collection::new());
        }
        let value: Value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        match value {
            Value::Object(object) => Ok(Collection::from_object(object)),
            _ => Err(StoreError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    /// Fail-soft load: any failure reads as "no records yet".
    pub fn load(&self) -> Collection {
        match self.try_load() {
            Ok(collection) => collection,
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "store unreadable, treating as empty");
                Collection::new()
            }
        }
    }

    /// Replace the file atomically (temp file in the same directory, then rename).
    pub fn save(&self, collection: &Collection) -> Result<(), StoreError> {
        let mut rendered = serde_json::to_vec_pretty(&Value::Object(collection.to_object()?))?;
        rendered.push(b'\n');

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(&dir).map_err(write_err)?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        temp.write_all(&rendered).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|err| write_err(err.error))?;
        Ok(())
    }

    /// Move an unreadable store aside so the next write does not destroy it.
    pub fn quarantine(&self, now: WallClock) -> Result<PathBuf, StoreError> {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", now.0));
        let target = self.path.with_file_name(name);
        fs::rename(&self.path, &target).map_err(|source| StoreError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}
