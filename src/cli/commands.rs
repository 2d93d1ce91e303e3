//! CLI command definitions

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// QtEmu machine manager CLI
#[derive(Parser, Debug)]
#[command(name = "qtemu", about = "QEMU machine definition manager")]
pub struct Cli {
    /// Directory holding qtemu.json (default: ~/.qtemu/)
    #[arg(long, global = true, env = "QTEMU_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// Directory new machine folders are created in (default: ~)
    #[arg(long, global = true, env = "QTEMU_MACHINE_PATH")]
    pub machine_path: Option<PathBuf>,

    /// Log filter (e.g. warn, debug, qtemu=trace)
    #[arg(long, global = true, env = "QTEMU_LOG", default_value = "warn")]
    pub log: String,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a new machine (folder, config file and registry entry)
    Create {
        name: String,

        /// Operating system type (linux|windows|bsd|other)
        #[arg(long, default_value = "linux")]
        os_type: String,

        /// Operating system version (see `qtemu os-types`)
        #[arg(long)]
        os_version: Option<String>,

        #[arg(long, default_value = "")]
        description: String,

        /// QEMU machine type
        #[arg(long = "type", default_value = "pc-q35")]
        machine_type: String,

        /// Memory (MB)
        #[arg(long, default_value_t = 2048)]
        ram: u32,

        /// CPU model (e.g., qemu64, host, max, …)
        #[arg(long, default_value = "qemu64")]
        cpu_type: String,

        /// Simple vCPU count (ignored if sockets/cores/threads provided)
        #[arg(long)]
        cpus: Option<u32>,

        /// CPU topology: sockets
        #[arg(long)]
        sockets: Option<u32>,

        /// CPU topology: cores per socket
        #[arg(long)]
        cores: Option<u32>,

        /// CPU topology: threads per core
        #[arg(long)]
        threads: Option<u32>,

        /// Maximum hotpluggable CPUs (default: CPU count)
        #[arg(long)]
        max_hot_cpus: Option<u32>,

        /// Display adapter (std|cirrus|vmware|qxl|virtio|none)
        #[arg(long, default_value = "std")]
        gpu: String,

        /// Keyboard layout
        #[arg(long, default_value = "en-us")]
        keyboard: String,

        /// Disable networking
        #[arg(long)]
        no_network: bool,

        /// Host sound system
        #[arg(long, default_value = "alsa")]
        host_sound: String,

        /// Emulated sound card (repeatable)
        #[arg(long = "audio")]
        audio: Vec<String>,

        /// Accelerator, in order of preference (repeatable; default kvm, tcg)
        #[arg(long = "accel")]
        accel: Vec<String>,

        /// Attach a disk image (repeatable)
        #[arg(long = "disk")]
        disks: Vec<PathBuf>,

        /// Attach an optical image (repeatable)
        #[arg(long = "cdrom")]
        cdroms: Vec<PathBuf>,

        /// Boot device order
        #[arg(long, value_delimiter = ',', default_values = ["hdd", "cdrom"])]
        boot_order: Vec<String>,

        /// Show the boot menu
        #[arg(long)]
        boot_menu: bool,

        /// Boot this kernel directly
        #[arg(long)]
        kernel: Option<String>,

        #[arg(long, requires = "kernel")]
        initrd: Option<String>,

        #[arg(long, requires = "kernel")]
        kernel_args: Option<String>,
    },

    /// List registered machines
    List,

    /// Show a machine's configuration
    Show {
        uuid: String,
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },

    /// Delete a machine and its associated files
    Delete {
        uuid: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// List known operating system types and versions
    OsTypes,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate man page
    ManPage,
}
