//! JSON mapping for machine files and the registry document
//!
//! Everything here is a pure transformation: no file access, no locking.
//! Decoding is tolerant. Missing keys, `null` and wrongly typed values take
//! zero values field by field, and a document that does not parse at all
//! yields an empty result, so callers must run [`Machine::validate`] before
//! trusting a decoded machine.

use crate::config::schema::{Machine, MachineState, RegistryDocument, RegistryRecord};
use crate::error::MachineError;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Decode a machine document, falling back to an empty machine on parse errors
pub fn decode(document: &str, config_path: &Path) -> Machine {
    try_decode(document, config_path).unwrap_or_else(|e| {
        warn!("{e}");
        Machine {
            config_path: config_path.to_path_buf(),
            ..Machine::default()
        }
    })
}

/// Strict variant of [`decode`]
pub fn try_decode(document: &str, config_path: &Path) -> Result<Machine> {
    let mut machine: Machine =
        serde_json::from_str(document).map_err(|source| MachineError::MalformedDocument {
            path: config_path.to_path_buf(),
            source,
        })?;
    machine.config_path = config_path.to_path_buf();
    machine.state = MachineState::Stopped;
    Ok(machine)
}

pub fn encode(machine: &Machine) -> Result<String> {
    serde_json::to_string_pretty(machine).map_err(|source| MachineError::Encode {
        name: machine.name.clone(),
        source,
    })
}

impl RegistryDocument {
    /// Parse a registry for reading; blank or malformed input is an empty registry
    pub fn parse(document: &str) -> Self {
        Self::try_parse(document).unwrap_or_else(|e| {
            warn!("malformed registry document: {e}");
            Self::default()
        })
    }

    /// Parse a registry that is about to be rewritten. Blank input is empty,
    /// but a document that does not parse is an error so it is never replaced.
    pub fn try_parse(document: &str) -> serde_json::Result<Self> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(document)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| MachineError::Encode {
            name: "qtemu.json".into(),
            source,
        })
    }

    pub fn find(&self, uuid: &str) -> Option<&RegistryRecord> {
        self.machines.iter().find(|r| r.matches(uuid))
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.find(uuid).is_some()
    }
}

pub fn list_registry_records(document: &str) -> Vec<RegistryRecord> {
    RegistryDocument::parse(document).machines
}

/// Result of [`remove_registry_record`]
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryRemoval {
    pub document: RegistryDocument,
    pub record: Option<RegistryRecord>,
}

impl RegistryRemoval {
    pub fn removed(&self) -> bool {
        self.record.is_some()
    }

    pub fn removed_path(&self) -> Option<&PathBuf> {
        self.record.as_ref().map(|r| &r.path)
    }
}

/// Drop the first record matching `uuid`; the document is unchanged otherwise
pub fn remove_registry_record(mut document: RegistryDocument, uuid: &str) -> RegistryRemoval {
    let record = document
        .machines
        .iter()
        .position(|r| r.matches(uuid))
        .map(|pos| document.machines.remove(pos));
    RegistryRemoval { document, record }
}
