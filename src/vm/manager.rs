//! Machine lifecycle management

use crate::config::schema::{validate_name, Machine, RegistryRecord};
use crate::config::settings::{Settings, SettingsProvider};
use crate::error::MachineError;
use crate::vm::config::{read_machine_file, save_machine};
use crate::vm::creator::{build_machine, CreateParams};
use crate::vm::directory::{create_machine_tree, delete_machine_tree, rollback_machine_tree};
use crate::vm::registry::Registry;
use crate::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Machine manager for lifecycle operations
pub struct MachineManager<S = Settings> {
    settings: S,
}

impl<S: SettingsProvider> MachineManager<S> {
    pub fn new(settings: S) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn registry(&self) -> Registry {
        Registry::new(&self.settings.data_folder())
    }

    /// Create the machine folder, write its configuration and register it.
    ///
    /// The folder is removed again if any later step fails.
    pub fn create_machine(&self, params: CreateParams) -> Result<Machine> {
        validate_name(&params.name).map_err(MachineError::Invalid)?;

        let base = self.settings.machine_path();
        let root = create_machine_tree(&base, &params.name).inspect_err(|e| {
            rollback_machine_tree(&base, &params.name, e);
        })?;
        let machine = build_machine(params, &root);

        let committed = save_machine(&machine)
            .and_then(|()| self.registry().append(RegistryRecord::for_machine(&machine)));
        if let Err(e) = committed {
            if !delete_machine_tree(&root) {
                warn!("could not roll back {}", root.display());
            }
            return Err(e);
        }

        info!("created machine '{}' ({})", machine.name, machine.uuid);
        Ok(machine)
    }

    pub fn list_machines(&self) -> Result<Vec<RegistryRecord>> {
        self.registry().records()
    }

    /// Load and validate the machine registered under `uuid`
    pub fn load_machine(&self, uuid: &str) -> Result<Machine> {
        let record = self
            .registry()
            .find(uuid)?
            .ok_or_else(|| MachineError::NotFound {
                uuid: uuid.to_string(),
            })?;

        let config_path = locate_config(&record)?;
        let machine = read_machine_file(&config_path)?;
        machine.validate().map_err(MachineError::Invalid)?;
        Ok(machine)
    }

    /// Write an edited machine back to its configuration file
    pub fn save_machine(&self, machine: &Machine) -> Result<()> {
        machine.validate().map_err(MachineError::Invalid)?;
        save_machine(machine)
    }

    /// Unregister `uuid` and delete its folder, returning the removed path.
    ///
    /// Nothing on disk is touched when the uuid is unknown. If the folder
    /// cannot be removed after the registry was rewritten the error is
    /// [`MachineError::PartialDeletion`].
    pub fn delete_machine(&self, uuid: &str) -> Result<PathBuf> {
        let record = self.registry().remove(uuid)?;

        if !delete_machine_tree(&record.path) {
            return Err(MachineError::PartialDeletion {
                uuid: uuid.to_string(),
                path: record.path,
            });
        }

        info!("deleted machine {uuid} at {}", record.path.display());
        Ok(record.path)
    }
}

/// Config file of a registered machine: `configpath`, else the first `*.json` in its folder
fn locate_config(record: &RegistryRecord) -> Result<PathBuf> {
    if let Some(path) = &record.config_path {
        return Ok(path.clone());
    }

    let read_dir_failed = |source| MachineError::FileUnreadable {
        path: record.path.clone(),
        source,
    };
    let mut candidates: Vec<PathBuf> = fs::read_dir(&record.path)
        .map_err(read_dir_failed)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        MachineError::FileUnreadable {
            path: record.path.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no machine configuration file in folder",
            ),
        }
    })
}
