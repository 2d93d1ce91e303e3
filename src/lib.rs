//! QtEmu - machine definition library
//!
//! Persistence for QEMU machine definitions: the per-machine JSON file, the
//! shared `qtemu.json` registry and the on-disk machine folders.

pub mod cli;
pub mod config;
pub mod error;
pub mod utils;
pub mod vm;

// Re-export commonly used types
pub use config::schema::Machine;
pub use config::settings::{Settings, SettingsProvider};
pub use error::MachineError;
pub use vm::manager::MachineManager;

/// Library result type
pub type Result<T> = std::result::Result<T, MachineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cli::present::format_machine;
    use config::catalog::OsType;
    use config::schema::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use utils::paths::{is_single_component, machine_conf_path, registry_path};
    use uuid::Uuid;
    use vm::codec::*;
    use vm::directory::{create_machine_tree, delete_machine_tree, rollback_machine_tree};

    fn sample_machine() -> Machine {
        Machine {
            uuid: Uuid::new_v4(),
            name: "debian-12".to_string(),
            description: "build box".to_string(),
            os_type: "GNU/Linux".to_string(),
            os_version: "Debian".to_string(),
            machine_type: "pc-q35".to_string(),
            config_path: PathBuf::from("/vms/debian-12/debian-12.json"),
            path: PathBuf::from("/vms/debian-12"),
            ram_mb: 4096,
            cpu: Processor {
                cpu_type: "host".to_string(),
                cpu_count: 8,
                cores_per_socket: 4,
                socket_count: 1,
                threads_per_core: 2,
                max_hotpluggable_cpus: 16,
            },
            gpu: Graphics {
                gpu_type: "virtio".to_string(),
                keyboard_layout: "es".to_string(),
            },
            state: MachineState::Stopped,
            use_network: true,
            host_sound_system: "pa".to_string(),
            sound_cards: vec!["hda".to_string(), "ac97".to_string()],
            accelerators: vec!["kvm".to_string(), "tcg".to_string()],
            boot: BootConfig {
                boot_menu_enabled: true,
                boot_order: vec!["cdrom".to_string(), "hdd".to_string(), "network".to_string()],
                kernel_boot: KernelBoot {
                    enabled: true,
                    kernel_path: "/boot/vmlinuz".to_string(),
                    initrd_path: "/boot/initrd.img".to_string(),
                    kernel_args: "console=ttyS0".to_string(),
                },
            },
            media: vec![
                Media {
                    name: "root.qcow2".to_string(),
                    path: PathBuf::from("/vms/debian-12/root.qcow2"),
                    media_type: "hdd".to_string(),
                    drive_interface: "virtio".to_string(),
                    uuid: Some(Uuid::new_v4()),
                },
                Media {
                    name: "netinst.iso".to_string(),
                    path: PathBuf::from("/isos/netinst.iso"),
                    media_type: "cdrom".to_string(),
                    drive_interface: "ide".to_string(),
                    uuid: None,
                },
            ],
        }
    }

    fn record(uuid: &str, path: &str) -> RegistryRecord {
        RegistryRecord {
            uuid: uuid.to_string(),
            path: PathBuf::from(path),
            ..RegistryRecord::default()
        }
    }

    #[test]
    fn test_registry_path() {
        let root = PathBuf::from("/tmp/test");
        assert_eq!(registry_path(&root), root.join("qtemu.json"));
        assert_eq!(
            machine_conf_path(&root, "vm1"),
            PathBuf::from("/tmp/test/vm1.json")
        );
    }

    #[test]
    fn test_single_component_names() {
        assert!(is_single_component("vm1"));
        assert!(is_single_component("my machine"));
        assert!(!is_single_component("a/b"));
        assert!(!is_single_component(".."));
        assert!(!is_single_component("."));
        assert!(!is_single_component("/abs"));
        assert!(!is_single_component(""));
    }

    #[test]
    fn test_machine_round_trip() {
        let machine = sample_machine();
        let json = encode(&machine).unwrap();
        let decoded = decode(&json, &machine.config_path);
        assert_eq!(decoded, machine);
    }

    #[test]
    fn test_wire_field_names() {
        let json = encode(&sample_machine()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["OSType"], "GNU/Linux");
        assert_eq!(value["RAM"], 4096);
        assert_eq!(value["network"], true);
        assert_eq!(value["gpu"]["GPUType"], "virtio");
        assert_eq!(value["cpu"]["coresSocket"], 4);
        assert_eq!(value["cpu"]["maxHotCPU"], 16);
        assert_eq!(value["boot"]["kernelBoot"]["kernelArgs"], "console=ttyS0");
        assert_eq!(value["media"][0]["interface"], "virtio");
        assert_eq!(value["audio"][1], "ac97");
        assert!(value.get("state").is_none());
        assert!(value["media"][1].get("uuid").is_none());
    }

    #[test]
    fn test_state_is_not_persisted() {
        let mut machine = sample_machine();
        machine.state = MachineState::Running;
        let json = encode(&machine).unwrap();
        let decoded = decode(&json, Path::new("/x.json"));
        assert_eq!(decoded.state, MachineState::Stopped);
    }

    #[test]
    fn test_decode_missing_fields() {
        let json = r#"{"name": "bare", "uuid": "6f1c4b0e-4f39-4c4d-9a43-1d8f5f0c2a11"}"#;
        let machine = decode(json, Path::new("/vms/bare/bare.json"));

        assert_eq!(machine.name, "bare");
        assert_eq!(machine.config_path, PathBuf::from("/vms/bare/bare.json"));
        assert_eq!(machine.gpu, Graphics::default());
        assert_eq!(machine.cpu.cpu_count, 0);
        assert_eq!(machine.ram_mb, 0);
        assert!(!machine.use_network);
        assert!(machine.boot.boot_order.is_empty());
        assert!(!machine.boot.kernel_boot.enabled);
        assert!(machine.media.is_empty());
        assert!(machine.validate().is_ok());
    }

    #[test]
    fn test_decode_malformed_document() {
        let machine = decode("{ not json", Path::new("/vms/broken.json"));
        assert_eq!(machine.name, "");
        assert_eq!(machine.config_path, PathBuf::from("/vms/broken.json"));
        assert!(machine.validate().is_err());

        let err = try_decode("{ not json", Path::new("/vms/broken.json")).unwrap_err();
        assert!(matches!(err, MachineError::MalformedDocument { .. }));
    }

    #[test]
    fn test_decode_legacy_uuids() {
        let json = r#"{
            "name": "legacy",
            "uuid": "{6f1c4b0e-4f39-4c4d-9a43-1d8f5f0c2a11}",
            "media": [
                {"name": "a", "path": "/a.img", "type": "hdd", "interface": "ide", "uuid": "garbage"},
                {"name": "b", "path": "/b.iso", "type": "cdrom", "interface": "ide"}
            ]
        }"#;
        let machine = decode(json, Path::new("/legacy.json"));
        assert_eq!(
            machine.uuid,
            Uuid::parse_str("6f1c4b0e-4f39-4c4d-9a43-1d8f5f0c2a11").unwrap()
        );
        assert_eq!(machine.media.len(), 2);
        assert!(machine.media.iter().all(|m| m.uuid.is_none()));
    }

    #[test]
    fn test_decode_null_and_mistyped_fields() {
        let json = r#"{
            "name": "vm1",
            "uuid": "6f1c4b0e-4f39-4c4d-9a43-1d8f5f0c2a11",
            "RAM": 2048,
            "description": null,
            "network": 1,
            "gpu": null,
            "audio": ["ac97", 7],
            "media": [{"name": "a", "path": null}, 5]
        }"#;
        let machine = decode(json, Path::new("/vms/vm1/vm1.json"));
        assert_eq!(machine.name, "vm1");
        assert_eq!(machine.ram_mb, 2048);
        assert_eq!(machine.description, "");
        assert!(!machine.use_network);
        assert_eq!(machine.gpu, Graphics::default());
        assert_eq!(machine.sound_cards, vec!["ac97", ""]);
        assert_eq!(machine.media.len(), 2);
        assert_eq!(machine.media[0].name, "a");
        assert_eq!(machine.media[0].path, PathBuf::new());
        assert_eq!(machine.media[1], Media::default());
        assert!(machine.validate().is_ok());

        let json = r#"{"RAM": "2048", "cpu": {"CPUCount": 4, "CPUType": false}}"#;
        let machine = try_decode(json, Path::new("/x.json")).unwrap();
        assert_eq!(machine.ram_mb, 0);
        assert_eq!(machine.cpu.cpu_count, 4);
        assert_eq!(machine.cpu.cpu_type, "");
    }

    #[test]
    fn test_nil_media_uuid_survives_round_trip() {
        let mut machine = sample_machine();
        machine.media[1].uuid = Some(Uuid::nil());
        let decoded = decode(&encode(&machine).unwrap(), &machine.config_path);
        assert_eq!(decoded.media[1].uuid, Some(Uuid::nil()));
        assert_eq!(decoded, machine);
    }

    #[test]
    fn test_order_preserved() {
        let mut machine = sample_machine();
        machine.boot.boot_order = vec!["network".into(), "cdrom".into(), "hdd".into()];
        machine.accelerators = vec!["tcg".into(), "kvm".into()];
        let names: Vec<String> = (0..5).map(|i| format!("disk{i}")).collect();
        machine.media = names
            .iter()
            .map(|n| Media {
                name: n.clone(),
                uuid: Some(Uuid::new_v4()),
                ..Media::default()
            })
            .collect();

        let decoded = decode(&encode(&machine).unwrap(), &machine.config_path);
        let decoded_names: Vec<String> = decoded.media.iter().map(|m| m.name.clone()).collect();
        assert_eq!(decoded_names, names);
        assert_eq!(decoded.boot.boot_order, machine.boot.boot_order);
        assert_eq!(decoded.accelerators, vec!["tcg", "kvm"]);
    }

    #[test]
    fn test_add_media_rejects_duplicate_uuid() {
        let mut machine = sample_machine();
        let existing = machine.media[0].clone();
        assert!(machine.add_media(existing).is_err());
        assert!(machine.add_media(Media::default()).is_ok());
        assert!(machine.add_media(Media::default()).is_ok());
        assert_eq!(machine.media.len(), 4);
    }

    #[test]
    fn test_validate_name_length() {
        let mut machine = sample_machine();
        machine.name = "x".repeat(MAX_NAME_LEN);
        assert!(machine.validate().is_ok());
        machine.name.push('x');
        assert!(machine.validate().is_err());
        machine.name = "   ".to_string();
        assert!(machine.validate().is_err());
    }

    #[test]
    fn test_remove_registry_record() {
        let document = RegistryDocument {
            machines: vec![record("A", "/a"), record("B", "/b")],
            ..RegistryDocument::default()
        };

        let removal = remove_registry_record(document.clone(), "B");
        assert!(removal.removed());
        assert_eq!(removal.removed_path(), Some(&PathBuf::from("/b")));
        assert_eq!(removal.document.machines, vec![record("A", "/a")]);

        let removal = remove_registry_record(document.clone(), "C");
        assert!(!removal.removed());
        assert_eq!(removal.removed_path(), None);
        assert_eq!(removal.document, document);
    }

    #[test]
    fn test_remove_first_match_only() {
        let document = RegistryDocument {
            machines: vec![record("A", "/a1"), record("A", "/a2")],
            ..RegistryDocument::default()
        };
        let removal = remove_registry_record(document, "A");
        assert_eq!(removal.removed_path(), Some(&PathBuf::from("/a1")));
        assert_eq!(removal.document.machines, vec![record("A", "/a2")]);
    }

    #[test]
    fn test_registry_uuid_spellings() {
        let r = record("{6f1c4b0e-4f39-4c4d-9a43-1d8f5f0c2a11}", "/vm");
        assert!(r.matches("6f1c4b0e-4f39-4c4d-9a43-1d8f5f0c2a11"));
        assert!(r.matches("6F1C4B0E-4F39-4C4D-9A43-1D8F5F0C2A11"));
        assert!(!r.matches("00000000-4f39-4c4d-9a43-1d8f5f0c2a11"));
    }

    #[test]
    fn test_list_registry_records() {
        let json = r#"{"machines": [
            {"uuid": "A", "path": "/a", "name": "alpha", "icon": "linux"},
            {"uuid": "B", "path": "/b"}
        ]}"#;
        let records = list_registry_records(json);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("alpha"));
        assert_eq!(records[0].extra["icon"], "linux");
        assert_eq!(records[1].path, PathBuf::from("/b"));

        assert!(list_registry_records("").is_empty());
        assert!(list_registry_records("[1, 2").is_empty());
        assert!(list_registry_records("{}").is_empty());
    }

    #[test]
    fn test_registry_keeps_unknown_fields() {
        let json = r#"{"version": 2, "machines": [{"uuid": "A", "path": "/a", "icon": "bsd"}]}"#;
        let document = RegistryDocument::parse(json);
        let rewritten: serde_json::Value =
            serde_json::from_str(&document.to_json().unwrap()).unwrap();
        assert_eq!(rewritten["version"], 2);
        assert_eq!(rewritten["machines"][0]["icon"], "bsd");
    }

    #[test]
    fn test_registry_record_odd_fields_kept() {
        let json = r#"{"machines": [
            {"uuid": "A", "path": "/a"},
            {"uuid": "B", "path": null, "name": 42},
            {"uuid": 7, "path": "/c"}
        ]}"#;
        let document = RegistryDocument::try_parse(json).unwrap();
        assert_eq!(document.machines.len(), 3);
        assert_eq!(document.machines[1].name, None);
        assert_eq!(document.machines[1].path, PathBuf::new());
        assert_eq!(document.machines[2].uuid, "");
        assert!(document.contains("B"));
        assert!(!document.contains(""));

        let rewritten: serde_json::Value =
            serde_json::from_str(&document.to_json().unwrap()).unwrap();
        let original: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(rewritten, original);
    }

    #[test]
    fn test_registry_try_parse() {
        assert_eq!(RegistryDocument::try_parse("  ").unwrap(), RegistryDocument::default());
        assert!(RegistryDocument::try_parse("{ not json").is_err());
        assert!(RegistryDocument::try_parse(r#"{"machines": 3}"#).is_err());
        assert!(RegistryDocument::parse(r#"{"machines": 3}"#).machines.is_empty());
    }

    #[test]
    fn test_create_machine_tree() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        let root = create_machine_tree(base, "vm1").unwrap();
        assert_eq!(root, base.join("vm1"));
        assert!(root.is_dir());
        assert!(root.join("logs").is_dir());

        fs::write(root.join("marker"), "keep").unwrap();
        let err = create_machine_tree(base, "vm1").unwrap_err();
        assert!(matches!(err, MachineError::AlreadyExists { ref name, .. } if name == "vm1"));
        assert_eq!(fs::read_to_string(root.join("marker")).unwrap(), "keep");
    }

    #[test]
    fn test_create_machine_tree_rejects_nested_name() {
        let temp_dir = TempDir::new().unwrap();
        let err = create_machine_tree(temp_dir.path(), "../escape").unwrap_err();
        assert!(matches!(err, MachineError::Invalid(_)));
        assert!(!temp_dir.path().join("../escape").exists());
    }

    #[test]
    fn test_create_machine_tree_creates_missing_base() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("not").join("yet");
        let root = create_machine_tree(&base, "vm1").unwrap();
        assert!(root.join("logs").is_dir());
    }

    #[test]
    fn test_delete_machine_tree() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_machine_tree(temp_dir.path(), "vm1").unwrap();
        fs::create_dir_all(root.join("snapshots/deep")).unwrap();
        fs::write(root.join("snapshots/deep/s1.qcow2"), b"data").unwrap();
        fs::write(root.join("logs/qemu.log"), b"log").unwrap();

        assert!(delete_machine_tree(&root));
        assert!(!root.exists());
        assert!(delete_machine_tree(&root));
        assert!(!delete_machine_tree(Path::new("")));
    }

    #[test]
    fn test_rollback_machine_tree() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let root = base.join("vm1");
        fs::create_dir_all(&root).unwrap();

        let other = MachineError::AlreadyExists {
            name: "vm1".into(),
            parent: base.to_path_buf(),
        };
        assert!(!rollback_machine_tree(base, "vm1", &other));
        assert!(root.exists());

        let root_failed = MachineError::CreateFailed {
            path: root.clone(),
            source: std::io::Error::other("denied"),
        };
        assert!(!rollback_machine_tree(base, "vm1", &root_failed));
        assert!(root.exists());

        let logs_failed = MachineError::CreateFailed {
            path: root.join("logs"),
            source: std::io::Error::other("denied"),
        };
        assert!(rollback_machine_tree(base, "vm1", &logs_failed));
        assert!(!root.exists());
    }

    #[test]
    fn test_settings_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("settings.json");
        fs::write(
            &file,
            r#"{"DataFolder": {"QtEmuData": "/data/qtemu"}, "Configuration": {"machinePath": "/vms"}}"#,
        )
        .unwrap();

        let settings = Settings::from_file(&file).unwrap();
        assert_eq!(settings.data_folder(), PathBuf::from("/data/qtemu"));
        assert_eq!(settings.machine_path(), PathBuf::from("/vms"));

        let settings = settings.with_overrides(None, Some(PathBuf::from("/other")));
        assert_eq!(settings.data_folder(), PathBuf::from("/data/qtemu"));
        assert_eq!(settings.machine_path(), PathBuf::from("/other"));
    }

    #[test]
    fn test_settings_fallbacks() {
        let temp_dir = TempDir::new().unwrap();
        let defaults = Settings::defaults().unwrap();
        assert!(defaults.data_folder().ends_with(".qtemu"));

        let missing = Settings::from_file(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(missing, defaults);

        let file = temp_dir.path().join("settings.json");
        fs::write(&file, "not json").unwrap();
        assert_eq!(Settings::from_file(&file).unwrap(), defaults);

        let file = temp_dir.path().join("partial.json");
        fs::write(&file, r#"{"Configuration": {"machinePath": "/vms"}}"#).unwrap();
        let partial = Settings::from_file(&file).unwrap();
        assert_eq!(partial.data_folder(), defaults.data_folder());
        assert_eq!(partial.machine_path(), PathBuf::from("/vms"));
    }

    #[test]
    fn test_os_catalog() {
        assert_eq!("linux".parse::<OsType>().unwrap(), OsType::Linux);
        assert_eq!("Microsoft Windows".parse::<OsType>().unwrap(), OsType::Windows);
        assert!("beos".parse::<OsType>().is_err());
        assert_eq!(OsType::Bsd.default_version(), "FreeBSD");
        assert_eq!(OsType::Linux.find_version("arch linux"), Some("Arch Linux"));
        assert_eq!(OsType::Other.find_version("Plan 9"), None);
    }

    #[test]
    fn test_cpu_topology_total() {
        let cpu = sample_machine().cpu;
        assert_eq!(cpu.topology_total(), 8);
        assert_eq!(Processor::default().topology_total(), 0);
    }

    #[test]
    fn test_format_machine() {
        let mut machine = sample_machine();
        let text = format_machine(&machine);
        assert!(text.starts_with("Name:        debian-12\n"));
        assert!(text.ends_with('\n'));
        assert!(text.contains("Description: build box\n"));
        assert!(text.contains("RAM:         4096 MB\n"));
        assert!(text.contains("Boot order:  cdrom, hdd, network (menu)\n"));
        assert!(text.contains("Kernel:      /boot/vmlinuz"));
        assert_eq!(text.matches("Media:").count(), 2);
        assert!(!text.contains("note: topology"));

        machine.description.clear();
        machine.cpu.cpu_count = 2;
        let text = format_machine(&machine);
        assert!(!text.contains("Description:"));
        assert!(text.contains("note: topology gives 8 CPUs"));
    }
}
