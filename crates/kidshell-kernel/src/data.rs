//! Custom data: parent-written lookup tables the child can query by key.
//!
//! Every `*.json` / `*.data` file in a data directory holds one JSON object.
//! Directories are read in order and files within a directory by name;
//! later keys override earlier ones.
//!
//! ```text
//! data/
//! ├── family.json     {"grandma": "Rosa", "dog": "Biscuit"}
//! └── school.data     {"teacher": "Mr. Okafor"}
//! ```
//!
//! A file is read only if it is a regular file (not a symlink) that
//! resolves inside its directory, is at most [`MAX_FILE_BYTES`], and nests
//! no deeper than [`MAX_DEPTH`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use thiserror::Error;

pub const MAX_FILE_BYTES: u64 = 1024 * 1024;
pub const MAX_DEPTH: usize = 10;
pub const EXTENSIONS: &[&str] = &["json", "data"];

pub type CustomData = BTreeMap<String, JsonValue>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: not a JSON object ({detail})")]
    Parse { path: PathBuf, detail: String },

    #[error("{path}: {size} bytes is over the 1 MiB limit")]
    TooLarge { path: PathBuf, size: u64 },

    #[error("{0}: nested deeper than 10 levels")]
    TooDeep(PathBuf),

    #[error("{0}: resolves outside its data directory")]
    PathEscape(PathBuf),

    #[error("{0}: symlinks are not followed")]
    Symlink(PathBuf),

    #[error("{0}: only .json and .data files are read")]
    WrongExtension(PathBuf),
}

/// Load and validate one data file that lives in `dir`.
pub fn load_file(dir: &Path, path: &Path) -> Result<CustomData, DataError> {
    let io_err = |source: io::Error| DataError::Io {
        path: path.to_path_buf(),
        source,
    };

    if !has_data_extension(path) {
        return Err(DataError::WrongExtension(path.to_path_buf()));
    }

    let meta = fs::symlink_metadata(path).map_err(io_err)?;
    if meta.file_type().is_symlink() {
        return Err(DataError::Symlink(path.to_path_buf()));
    }

    let root = dir.canonicalize().map_err(io_err)?;
    let resolved = path.canonicalize().map_err(io_err)?;
    if !resolved.starts_with(&root) {
        return Err(DataError::PathEscape(path.to_path_buf()));
    }

    if meta.len() > MAX_FILE_BYTES {
        return Err(DataError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
        });
    }

    let text = fs::read_to_string(&resolved).map_err(io_err)?;
    let value: JsonValue = serde_json::from_str(&text).map_err(|e| DataError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if depth(&value) > MAX_DEPTH {
        return Err(DataError::TooDeep(path.to_path_buf()));
    }

    match value {
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        other => Err(DataError::Parse {
            path: path.to_path_buf(),
            detail: format!("found {}", kind_of(&other)),
        }),
    }
}

/// Every data file in `dir`, merged. Bad files are skipped with a warning.
///
/// A missing directory is simply empty.
pub fn load_dir(dir: &Path) -> CustomData {
    let mut merged = CustomData::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return merged,
        Err(e) => {
            tracing::warn!("Cannot read data directory {}: {}", dir.display(), e);
            return merged;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| has_data_extension(path))
        .collect();
    files.sort();

    for path in files {
        match load_file(dir, &path) {
            Ok(data) => {
                tracing::debug!(file = %path.display(), keys = data.len(), "loaded custom data");
                merged.extend(data);
            }
            Err(e) => tracing::warn!("Skipping custom data {}", e),
        }
    }
    merged
}

/// Merge every directory in order.
pub fn load_custom_data<P: AsRef<Path>>(dirs: &[P]) -> CustomData {
    let mut merged = CustomData::new();
    for dir in dirs {
        merged.extend(load_dir(dir.as_ref()));
    }
    merged
}

fn has_data_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Nesting depth: scalars are 0, each array or object adds one.
fn depth(value: &JsonValue) -> usize {
    match value {
        JsonValue::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        JsonValue::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}
