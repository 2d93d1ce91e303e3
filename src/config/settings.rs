//! Settings lookup for the data folder and the machine folder base

use crate::error::MachineError;
use crate::utils::paths::{default_data_folder, default_machine_path, settings_file};
use crate::Result;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-only access to the two settings the core depends on
pub trait SettingsProvider {
    /// Directory holding `qtemu.json`
    fn data_folder(&self) -> PathBuf;

    /// Directory new machine folders are created in
    fn machine_path(&self) -> PathBuf;
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    data_folder: PathBuf,
    machine_path: PathBuf,
}

// On-disk layout keeps the group/key names of the desktop settings store.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SettingsFile {
    #[serde(rename = "DataFolder")]
    data_folder: DataFolderGroup,
    #[serde(rename = "Configuration")]
    configuration: ConfigurationGroup,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct DataFolderGroup {
    #[serde(rename = "QtEmuData")]
    qtemu_data: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ConfigurationGroup {
    #[serde(rename = "machinePath")]
    machine_path: Option<PathBuf>,
}

impl Settings {
    pub fn new(data_folder: impl Into<PathBuf>, machine_path: impl Into<PathBuf>) -> Self {
        Self {
            data_folder: data_folder.into(),
            machine_path: machine_path.into(),
        }
    }

    /// `<home>/.qtemu/` and `<home>`
    pub fn defaults() -> Result<Self> {
        Ok(Self::new(default_data_folder()?, default_machine_path()?))
    }

    /// Defaults overlaid with the user's settings file, if there is one
    pub fn load() -> Result<Self> {
        match settings_file() {
            Some(path) => Self::from_file(&path),
            None => Self::defaults(),
        }
    }

    /// Defaults overlaid with the settings file at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut settings = Self::defaults()?;

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no settings file at {}", path.display());
                return Ok(settings);
            }
            Err(source) => {
                return Err(MachineError::FileUnreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        match serde_json::from_str::<SettingsFile>(&raw) {
            Ok(file) => {
                if let Some(dir) = file.data_folder.qtemu_data {
                    settings.data_folder = dir;
                }
                if let Some(dir) = file.configuration.machine_path {
                    settings.machine_path = dir;
                }
            }
            Err(e) => warn!("ignoring malformed settings file {}: {e}", path.display()),
        }
        Ok(settings)
    }

    /// Apply explicit overrides (command line or environment)
    pub fn with_overrides(
        mut self,
        data_folder: Option<PathBuf>,
        machine_path: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = data_folder {
            self.data_folder = dir;
        }
        if let Some(dir) = machine_path {
            self.machine_path = dir;
        }
        self
    }
}

impl SettingsProvider for Settings {
    fn data_folder(&self) -> PathBuf {
        self.data_folder.clone()
    }

    fn machine_path(&self) -> PathBuf {
        self.machine_path.clone()
    }
}
