//! JSON file persistence for knowledge bases.
//!
//! Writes go to a sibling temporary file that is renamed over the target, so
//! a crash mid-write leaves the previous file intact.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::StorageError;

/// Outcome of reading a knowledge-base file.
pub enum ReadOutcome<T> {
    Loaded(T),
    /// the file is missing or not readable by us
    Unavailable(io::Error),
}

/// Read and parse `path`. Only a missing or permission-denied file counts
/// as unavailable; any other read failure (undecodable bytes included) is
/// an error, so the caller never mistakes a damaged file for an empty one.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<ReadOutcome<T>, StorageError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ) =>
        {
            return Ok(ReadOutcome::Unavailable(err))
        }
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value = serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReadOutcome::Loaded(value))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(StorageError::Serialize)?;
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    {
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.write_all(b"\n").map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
    }
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
