//! Whole-document YAML read/write.
//!
//! Files are always read fully and overwritten fully. There is no locking and
//! no atomic rename: concurrent writers race and the last one wins.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};

/// Read a YAML mapping document into `T`.
///
/// A missing or empty file yields `T::default()`. A document whose top level
/// is not a mapping is rejected.
pub fn read_yaml<T>(path: &Path) -> CoreResult<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let text = fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|source| CoreError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        serde_yaml::Value::Null => Ok(T::default()),
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(value).map_err(|source| CoreError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Err(CoreError::Validation(format!(
            "invalid YAML structure in {}",
            path.display()
        ))),
    }
}

/// Serialize `data` and overwrite `path`, creating parent directories.
pub fn write_yaml<T: Serialize>(path: &Path, data: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }
    let text = serde_yaml::to_string(data).map_err(|source| CoreError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|e| CoreError::io(path, e))?;
    tracing::debug!(path = %path.display(), "wrote YAML document");
    Ok(())
}
