//! Building a new machine from creation parameters

use crate::config::schema::*;
use crate::utils::paths::machine_conf_path;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Machine creation parameters
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub name: String,
    pub description: String,
    pub os_type: String,
    pub os_version: String,
    pub machine_type: String,
    pub ram_mb: u32,
    pub cpu_type: String,
    pub cpus: Option<u32>,
    pub sockets: Option<u32>,
    pub cores: Option<u32>,
    pub threads: Option<u32>,
    pub max_hot_cpus: Option<u32>,
    pub gpu_type: String,
    pub keyboard_layout: String,
    pub use_network: bool,
    pub host_sound_system: String,
    pub sound_cards: Vec<String>,
    pub accelerators: Vec<String>,
    pub disks: Vec<PathBuf>,
    pub cdroms: Vec<PathBuf>,
    pub boot_order: Vec<String>,
    pub boot_menu: bool,
    pub kernel: Option<String>,
    pub initrd: Option<String>,
    pub kernel_args: Option<String>,
}

impl CreateParams {
    /// Parameters with the usual defaults for everything but the name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            os_type: "GNU/Linux".into(),
            os_version: "Debian".into(),
            machine_type: "pc-q35".into(),
            ram_mb: 2048,
            cpu_type: "qemu64".into(),
            cpus: None,
            sockets: None,
            cores: None,
            threads: None,
            max_hot_cpus: None,
            gpu_type: "std".into(),
            keyboard_layout: "en-us".into(),
            use_network: true,
            host_sound_system: "alsa".into(),
            sound_cards: Vec::new(),
            accelerators: vec!["kvm".into(), "tcg".into()],
            disks: Vec::new(),
            cdroms: Vec::new(),
            boot_order: vec!["hdd".into(), "cdrom".into()],
            boot_menu: false,
            kernel: None,
            initrd: None,
            kernel_args: None,
        }
    }

    /// (sockets, cores, threads)
    fn topology(&self) -> (u32, u32, u32) {
        if self.sockets.is_some() || self.cores.is_some() || self.threads.is_some() {
            (
                self.sockets.unwrap_or(1),
                self.cores.unwrap_or(1),
                self.threads.unwrap_or(1),
            )
        } else if let Some(n) = self.cpus {
            (1, n.max(1), 1)
        } else {
            (1, 2, 1)
        }
    }
}

/// Build the machine that will live in `root`
pub fn build_machine(params: CreateParams, root: &Path) -> Machine {
    let (sockets, cores, threads) = params.topology();
    let cpu_count = sockets.saturating_mul(cores).saturating_mul(threads);

    let kernel_boot = match params.kernel {
        Some(kernel_path) => KernelBoot {
            enabled: true,
            kernel_path,
            initrd_path: params.initrd.unwrap_or_default(),
            kernel_args: params.kernel_args.unwrap_or_default(),
        },
        None => KernelBoot::default(),
    };

    let media = params
        .disks
        .into_iter()
        .map(|p| new_media(p, "hdd", "virtio"))
        .chain(params.cdroms.into_iter().map(|p| new_media(p, "cdrom", "ide")))
        .collect();

    Machine {
        uuid: Uuid::new_v4(),
        config_path: machine_conf_path(root, &params.name),
        path: root.to_path_buf(),
        name: params.name,
        description: params.description,
        os_type: params.os_type,
        os_version: params.os_version,
        machine_type: params.machine_type,
        ram_mb: params.ram_mb,
        cpu: Processor {
            cpu_type: params.cpu_type,
            cpu_count,
            cores_per_socket: cores,
            socket_count: sockets,
            threads_per_core: threads,
            max_hotpluggable_cpus: params.max_hot_cpus.unwrap_or(cpu_count),
        },
        gpu: Graphics {
            gpu_type: params.gpu_type,
            keyboard_layout: params.keyboard_layout,
        },
        state: MachineState::Stopped,
        use_network: params.use_network,
        host_sound_system: params.host_sound_system,
        sound_cards: params.sound_cards,
        accelerators: params.accelerators,
        boot: BootConfig {
            boot_menu_enabled: params.boot_menu,
            boot_order: params.boot_order,
            kernel_boot,
        },
        media,
    }
}

fn new_media(path: PathBuf, media_type: &str, drive_interface: &str) -> Media {
    Media {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path,
        media_type: media_type.into(),
        drive_interface: drive_interface.into(),
        uuid: Some(Uuid::new_v4()),
    }
}
