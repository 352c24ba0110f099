//! Session persistence: one JSON snapshot, replaced atomically.
//!
//! Saving writes `<path>.tmp` and renames it over the target, so a crash
//! mid-write leaves the previous snapshot intact. Loading never fails the
//! caller: any problem means "start fresh".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session file {0} does not hold a session object")]
    WrongShape(PathBuf),
}

/// Read a session snapshot from `path`.
///
/// `Ok(None)` when there is no file.
pub fn load_session_from(path: &Path) -> Result<Option<Session>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let value: serde_json::Value = serde_json::from_str(&text).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !value.is_object() {
        return Err(StoreError::WrongShape(path.to_path_buf()));
    }

    Session::from_snapshot(value)
        .map(Some)
        .map_err(|_| StoreError::WrongShape(path.to_path_buf()))
}

/// Write `session` to `path` via a sibling temp file.
pub fn save_session_to(path: &Path, session: &Session) -> Result<(), StoreError> {
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_string_pretty(&session.snapshot()).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = temp_path(path);
    fs::write(&tmp, body).map_err(io_err)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(err));
    }
    Ok(())
}

/// The saved session at the default location, if one can be read.
pub fn load_persisted_session() -> Option<Session> {
    let path = paths::session_state_path();
    match load_session_from(&path) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Ignoring saved session: {}", e);
            None
        }
    }
}

/// Save to the default location. Returns whether the write landed.
pub fn save_persisted_session(session: &Session) -> bool {
    match save_session_to(&paths::session_state_path(), session) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to save session: {}", e);
            false
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
