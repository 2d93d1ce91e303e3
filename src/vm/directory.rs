//! Machine folder lifecycle

use crate::error::MachineError;
use crate::utils::paths::{is_single_component, logs_dir};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Create `base/name` and its `logs` subfolder, returning the machine root.
///
/// If `logs` cannot be created the root is left behind; the caller rolls it
/// back with [`rollback_machine_tree`].
pub fn create_machine_tree(base: &Path, name: &str) -> Result<PathBuf> {
    if !is_single_component(name) {
        return Err(MachineError::Invalid(format!(
            "'{name}' cannot be used as a folder name"
        )));
    }

    let root = base.join(name);
    if root.exists() {
        debug!("machine folder already exists: {}", root.display());
        return Err(MachineError::AlreadyExists {
            name: name.to_string(),
            parent: base.to_path_buf(),
        });
    }

    fs::create_dir_all(&root).map_err(|source| MachineError::CreateFailed {
        path: root.clone(),
        source,
    })?;

    let logs = logs_dir(&root);
    fs::create_dir(&logs).map_err(|source| MachineError::CreateFailed { path: logs, source })?;

    debug!("created machine folder {}", root.display());
    Ok(root)
}

/// Undo a failed [`create_machine_tree`] that got as far as creating the root.
///
/// Only acts when `err` reports the `logs` folder of `base/name`, so a root
/// that existed before the call is never touched. Returns whether a folder
/// was removed.
pub fn rollback_machine_tree(base: &Path, name: &str, err: &MachineError) -> bool {
    let root = base.join(name);
    match err {
        MachineError::CreateFailed { path, .. } if *path == logs_dir(&root) => {
            debug!("rolling back {}", root.display());
            delete_machine_tree(&root)
        }
        _ => false,
    }
}

/// Remove `path` and everything under it. A path that is already gone counts as removed.
pub fn delete_machine_tree(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        warn!("refusing to delete an empty machine path");
        return false;
    }
    if !path.exists() {
        return true;
    }
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("removed machine folder {}", path.display());
            true
        }
        Err(e) => {
            warn!("cannot remove {}: {e}", path.display());
            false
        }
    }
}
