//! The master registry file (`qtemu.json`)

use crate::config::schema::{RegistryDocument, RegistryRecord};
use crate::error::MachineError;
use crate::utils::fs::write_atomic;
use crate::utils::paths::{registry_lock_path, registry_path};
use crate::vm::codec::remove_registry_record;
use crate::Result;
use dir_lock::DirLock;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Registry bound to a data folder.
///
/// Updates hold a directory lock for the whole read-modify-write so two
/// processes cannot interleave their rewrites.
#[derive(Debug, Clone)]
pub struct Registry {
    data_folder: PathBuf,
    path: PathBuf,
}

impl Registry {
    pub fn new(data_folder: &Path) -> Self {
        Self {
            data_folder: data_folder.to_path_buf(),
            path: registry_path(data_folder),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry. A missing file is an empty registry.
    pub fn load(&self) -> Result<RegistryDocument> {
        Ok(self
            .read_raw()?
            .map(|raw| RegistryDocument::parse(&raw))
            .unwrap_or_default())
    }

    /// Read the registry ahead of a rewrite; a malformed file is an error.
    fn load_for_update(&self) -> Result<RegistryDocument> {
        let Some(raw) = self.read_raw()? else {
            return Ok(RegistryDocument::default());
        };
        RegistryDocument::try_parse(&raw).map_err(|source| MachineError::MalformedDocument {
            path: self.path.clone(),
            source,
        })
    }

    fn read_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no registry at {}", self.path.display());
                Ok(None)
            }
            Err(source) => Err(MachineError::FileUnreadable {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn records(&self) -> Result<Vec<RegistryRecord>> {
        Ok(self.load()?.machines)
    }

    pub fn find(&self, uuid: &str) -> Result<Option<RegistryRecord>> {
        Ok(self.load()?.find(uuid).cloned())
    }

    /// Add a record for a newly created machine
    pub fn append(&self, record: RegistryRecord) -> Result<()> {
        let lock = self.lock()?;
        let mut document = self.load_for_update()?;
        if document.contains(&record.uuid) {
            return Err(MachineError::Invalid(format!(
                "uuid '{}' is already registered",
                record.uuid
            )));
        }
        debug!("registering {} at {}", record.uuid, record.path.display());
        document.machines.push(record);
        self.store(&document)?;
        drop(lock);
        Ok(())
    }

    /// Remove the record for `uuid` and return it
    pub fn remove(&self, uuid: &str) -> Result<RegistryRecord> {
        let lock = self.lock()?;
        let removal = remove_registry_record(self.load_for_update()?, uuid);
        let Some(record) = removal.record else {
            return Err(MachineError::NotFound {
                uuid: uuid.to_string(),
            });
        };
        self.store(&removal.document)?;
        drop(lock);
        debug!("unregistered {uuid}");
        Ok(record)
    }

    fn store(&self, document: &RegistryDocument) -> Result<()> {
        write_atomic(&self.path, document.to_json()?.as_bytes())
    }

    fn lock(&self) -> Result<DirLock> {
        fs::create_dir_all(&self.data_folder).map_err(|source| MachineError::CreateFailed {
            path: self.data_folder.clone(),
            source,
        })?;
        let lock_dir = registry_lock_path(&self.data_folder);
        trace!("Trying to lock {lock_dir:?}");
        let lock = DirLock::new_sync(&lock_dir);
        lock.map_err(|source| MachineError::Lock {
            path: lock_dir,
            source,
        })
    }
}
