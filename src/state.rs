use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to write state to {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The single persisted record: last observed value and when it was written.
///
/// `last` is kept as raw JSON so a hand-edited file (`"23"`, `23.0`) still
/// reads as a record; [`StateRecord::last_value`] does the numeric conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    #[serde(default)]
    pub last: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl StateRecord {
    /// The stored value as a whole number. Integers, integral floats and
    /// strings holding either convert; anything else is `None`.
    pub fn last_value(&self) -> Option<i64> {
        match &self.last {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Outcome of reading the state file. A file that is not a JSON object with
/// the record's shape reads as `Absent` so monitoring restarts from scratch
/// instead of stalling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLookup {
    Found(StateRecord),
    Absent,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> StateLookup {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StateLookup::Absent,
            Err(e) => {
                log::warn!("Ignoring unreadable state file {}: {}", self.path.display(), e);
                return StateLookup::Absent;
            }
        };

        let parsed = serde_json::from_str::<Value>(&raw).and_then(|value| match value {
            Value::Object(_) => serde_json::from_value::<StateRecord>(value),
            other => Err(serde_json::Error::custom(format!(
                "expected an object, found {}",
                other
            ))),
        });

        match parsed {
            Ok(record) => StateLookup::Found(record),
            Err(e) => {
                log::warn!("Ignoring malformed state file {}: {}", self.path.display(), e);
                StateLookup::Absent
            }
        }
    }

    /// Replaces the record with `{last: value, updatedAt: now}`. The new
    /// content goes to a temp file next to the target and is renamed over it,
    /// so readers never see a half-written file.
    pub fn write(&self, value: i64, updated_at: String) -> Result<StateRecord, PersistError> {
        let record = StateRecord {
            last: Value::from(value),
            updated_at: Some(updated_at),
        };
        let mut content = serde_json::to_string_pretty(&record)?;
        content.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source: io::Error| PersistError::Io {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file_mut().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(record)
    }
}
