//! Machine configuration file management

use crate::config::schema::Machine;
use crate::error::MachineError;
use crate::utils::fs::write_atomic;
use crate::vm::codec::{decode, encode};
use crate::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a machine file. Only an unreadable file is an error; see [`decode`].
pub fn read_machine_file(config_path: &Path) -> Result<Machine> {
    let raw = fs::read_to_string(config_path).map_err(|source| MachineError::FileUnreadable {
        path: config_path.to_path_buf(),
        source,
    })?;
    debug!("read machine file {}", config_path.display());
    Ok(decode(&raw, config_path))
}

/// Save machine configuration to its `config_path`
pub fn save_machine(machine: &Machine) -> Result<()> {
    if machine.config_path.as_os_str().is_empty() {
        return Err(MachineError::Invalid(format!(
            "machine '{}' has no configuration path",
            machine.name
        )));
    }
    let json = encode(machine)?;
    write_atomic(&machine.config_path, json.as_bytes())?;
    debug!("wrote machine file {}", machine.config_path.display());
    Ok(())
}
