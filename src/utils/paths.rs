//! Path utility functions

use crate::error::MachineError;
use crate::Result;
use std::path::{Component, Path, PathBuf};

/// Get the user's home directory
pub fn home() -> Result<PathBuf> {
    dirs::home_dir().ok_or(MachineError::NoHome)
}

/// Default directory for `qtemu.json`
pub fn default_data_folder() -> Result<PathBuf> {
    Ok(home()?.join(".qtemu"))
}

/// Default parent directory for machine folders
pub fn default_machine_path() -> Result<PathBuf> {
    home()
}

/// Location of the optional settings file
pub fn settings_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qtemu").join("settings.json"))
}

/// Get the registry file path
pub fn registry_path(data_folder: &Path) -> PathBuf {
    data_folder.join("qtemu.json")
}

pub fn registry_lock_path(data_folder: &Path) -> PathBuf {
    data_folder.join(".qtemu.lock")
}

/// Get machine configuration file path
pub fn machine_conf_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.json"))
}

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

/// A machine name must be usable as exactly one directory name
pub fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}
