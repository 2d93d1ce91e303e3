//! Machine configuration schema definitions
//!
//! Field names follow the on-disk JSON layout of the machine configuration
//! file and the `qtemu.json` registry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use uuid::Uuid;

/// Longest accepted machine name, in characters.
pub const MAX_NAME_LEN: usize = 250;

/// Non-empty and at most [`MAX_NAME_LEN`] characters
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("machine name is empty".into());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "machine name is longer than {MAX_NAME_LEN} characters"
        ));
    }
    Ok(())
}

/// Runtime state of a machine. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineState {
    #[default]
    Stopped,
    Running,
    Paused,
    Saved,
}

/// One virtual machine's configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Machine {
    #[serde(with = "lenient_uuid")]
    pub uuid: Uuid,
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    #[serde(rename = "OSType", deserialize_with = "lenient::or_default")]
    pub os_type: String,
    #[serde(rename = "OSVersion", deserialize_with = "lenient::or_default")]
    pub os_version: String,
    #[serde(rename = "type", deserialize_with = "lenient::or_default")]
    pub machine_type: String,

    /// Location of this machine's JSON file. Supplied by whoever reads it.
    #[serde(skip)]
    pub config_path: PathBuf,
    #[serde(deserialize_with = "lenient::or_default")]
    pub path: PathBuf,

    #[serde(rename = "RAM", deserialize_with = "lenient::or_default")]
    pub ram_mb: u32,
    #[serde(deserialize_with = "lenient::or_default")]
    pub cpu: Processor,
    #[serde(deserialize_with = "lenient::or_default")]
    pub gpu: Graphics,

    #[serde(skip)]
    pub state: MachineState,

    #[serde(rename = "network", deserialize_with = "lenient::or_default")]
    pub use_network: bool,
    #[serde(rename = "hostsoundsystem", deserialize_with = "lenient::or_default")]
    pub host_sound_system: String,
    #[serde(rename = "audio", deserialize_with = "lenient::seq")]
    pub sound_cards: Vec<String>,
    #[serde(rename = "accelerator", deserialize_with = "lenient::seq")]
    pub accelerators: Vec<String>,

    #[serde(deserialize_with = "lenient::or_default")]
    pub boot: BootConfig,
    #[serde(deserialize_with = "lenient::seq")]
    pub media: Vec<Media>,
}

impl Machine {
    /// Check the fields a machine must carry before it is treated as loaded
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        if self.uuid.is_nil() {
            return Err(format!("machine '{}' has no valid uuid", self.name));
        }
        Ok(())
    }

    /// Append a media entry, rejecting a uuid already used on this machine
    pub fn add_media(&mut self, media: Media) -> Result<(), String> {
        if let Some(id) = media.uuid {
            if self.media.iter().any(|m| m.uuid == Some(id)) {
                return Err(format!("media '{id}' is already attached to '{}'", self.name));
            }
        }
        self.media.push(media);
        Ok(())
    }
}

/// Processor settings (`cpu` group)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Processor {
    #[serde(rename = "CPUType", deserialize_with = "lenient::or_default")]
    pub cpu_type: String,
    #[serde(rename = "CPUCount", deserialize_with = "lenient::or_default")]
    pub cpu_count: u32,
    #[serde(rename = "coresSocket", deserialize_with = "lenient::or_default")]
    pub cores_per_socket: u32,
    #[serde(rename = "socketCount", deserialize_with = "lenient::or_default")]
    pub socket_count: u32,
    #[serde(rename = "threadsCore", deserialize_with = "lenient::or_default")]
    pub threads_per_core: u32,
    #[serde(rename = "maxHotCPU", deserialize_with = "lenient::or_default")]
    pub max_hotpluggable_cpus: u32,
}

impl Processor {
    /// sockets × cores × threads; not enforced against `cpu_count`
    pub fn topology_total(&self) -> u32 {
        self.socket_count
            .saturating_mul(self.cores_per_socket)
            .saturating_mul(self.threads_per_core)
    }
}

/// Display adapter and keyboard (`gpu` group)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Graphics {
    #[serde(rename = "GPUType", deserialize_with = "lenient::or_default")]
    pub gpu_type: String,
    #[serde(rename = "keyboard", deserialize_with = "lenient::or_default")]
    pub keyboard_layout: String,
}

/// Boot settings, owned by exactly one machine
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct BootConfig {
    #[serde(rename = "bootMenu", deserialize_with = "lenient::or_default")]
    pub boot_menu_enabled: bool,
    /// Device types in the order they are tried
    #[serde(rename = "bootOrder", deserialize_with = "lenient::seq")]
    pub boot_order: Vec<String>,
    #[serde(rename = "kernelBoot", deserialize_with = "lenient::or_default")]
    pub kernel_boot: KernelBoot,
}

/// Direct kernel boot; paths only matter when `enabled`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct KernelBoot {
    #[serde(deserialize_with = "lenient::or_default")]
    pub enabled: bool,
    #[serde(rename = "kernelPath", deserialize_with = "lenient::or_default")]
    pub kernel_path: String,
    #[serde(rename = "initrdPath", deserialize_with = "lenient::or_default")]
    pub initrd_path: String,
    #[serde(rename = "kernelArgs", deserialize_with = "lenient::or_default")]
    pub kernel_args: String,
}

/// Disk or optical image attached to a machine
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Media {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub path: PathBuf,
    #[serde(rename = "type", deserialize_with = "lenient::or_default")]
    pub media_type: String,
    #[serde(rename = "interface", deserialize_with = "lenient::or_default")]
    pub drive_interface: String,
    #[serde(
        with = "lenient_uuid::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub uuid: Option<Uuid>,
}

/// Entry of the master registry
///
/// Known keys that hold an unexpected type stay in `extra` under their own
/// name, so rewriting the registry never loses what another tool wrote.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct RegistryRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "path_is_empty")]
    pub path: PathBuf,
    #[serde(rename = "configpath", skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    /// Fields written by other tools, kept on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn path_is_empty(path: &PathBuf) -> bool {
    path.as_os_str().is_empty()
}

impl<'de> Deserialize<'de> for RegistryRecord {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(d)?;
        let uuid = take_typed(&mut fields, "uuid").unwrap_or_default();
        let name = take_typed(&mut fields, "name");
        let path = take_typed(&mut fields, "path").unwrap_or_default();
        let config_path = take_typed(&mut fields, "configpath");
        Ok(Self {
            uuid,
            name,
            path,
            config_path,
            extra: fields,
        })
    }
}

/// Remove `key` from `fields` only if it converts to `T`
fn take_typed<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let typed = T::deserialize(fields.get(key)?).ok()?;
    fields.remove(key);
    Some(typed)
}

impl RegistryRecord {
    pub fn for_machine(machine: &Machine) -> Self {
        Self {
            uuid: machine.uuid.hyphenated().to_string(),
            name: Some(machine.name.clone()),
            path: machine.path.clone(),
            config_path: Some(machine.config_path.clone()),
            extra: Map::new(),
        }
    }

    /// Whether this record refers to `uuid`, tolerating braced/hyphenated spellings
    pub fn matches(&self, uuid: &str) -> bool {
        if self.uuid.is_empty() {
            return false;
        }
        if self.uuid == uuid {
            return true;
        }
        match (Uuid::parse_str(&self.uuid), Uuid::parse_str(uuid)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Contents of `qtemu.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RegistryDocument {
    #[serde(default)]
    pub machines: Vec<RegistryRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-field decoding: `null` or a value of the wrong type becomes the
/// field's default instead of failing the whole document.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let raw = Value::deserialize(d)?;
        Ok(T::deserialize(&raw).unwrap_or_default())
    }

    /// Non-arrays read as empty; each element is decoded on its own.
    pub fn seq<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .iter()
                .map(|item| T::deserialize(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Uuids are written hyphenated; anything unparseable reads as nil/absent.
mod lenient_uuid {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&id.hyphenated())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Uuid, D::Error> {
        Ok(optional::deserialize(d)?.unwrap_or_else(Uuid::nil))
    }

    pub mod optional {
        use super::*;
        use serde_json::Value;

        pub fn serialize<S: Serializer>(id: &Option<Uuid>, s: S) -> Result<S::Ok, S::Error> {
            match id {
                Some(id) => super::serialize(id, s),
                None => s.serialize_none(),
            }
        }

        /// A nil uuid is kept as `Some(nil)`; only unparseable values are absent.
        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Uuid>, D::Error> {
            let raw = Value::deserialize(d)?;
            Ok(raw.as_str().and_then(|s| Uuid::parse_str(s.trim()).ok()))
        }
    }
}
