//! Turning library results into messages for the terminal

use crate::config::schema::{Machine, RegistryRecord};
use crate::error::MachineError;

/// User-facing description of a failure
pub fn describe(err: &MachineError) -> String {
    match err {
        MachineError::FileUnreadable { path, .. } => format!(
            "Cannot read {}. Check that the file exists and is readable.",
            path.display()
        ),
        MachineError::MalformedDocument { path, source } => {
            format!("{} is not a valid configuration file: {source}", path.display())
        }
        MachineError::AlreadyExists { name, parent } => format!(
            "A folder named '{name}' already exists in {}; it may belong to another machine. Choose a different name.",
            parent.display()
        ),
        MachineError::CreateFailed { path, source } => format!(
            "Cannot create {}: {source}. Check that the parent folder exists and is writable.",
            path.display()
        ),
        MachineError::NotFound { uuid } => format!("No machine with uuid {uuid} is registered"),
        MachineError::PartialDeletion { uuid, path } => format!(
            "Machine {uuid} was unregistered, but its files at {} could not be removed. Delete them manually.",
            path.display()
        ),
        other => other.to_string(),
    }
}

/// Convert a library error into one carrying the user-facing message
pub fn to_report(err: MachineError) -> anyhow::Error {
    anyhow::anyhow!(describe(&err))
}

/// One line per registered machine
pub fn format_records(records: &[RegistryRecord]) -> String {
    records
        .iter()
        .map(|r| {
            let name = r.name.as_deref().unwrap_or("-");
            format!("{}  {:<24}  {}\n", r.uuid, name, r.path.display())
        })
        .collect()
}

/// Human-readable summary of a machine
pub fn format_machine(m: &Machine) -> String {
    let cpu = &m.cpu;
    let boot = &m.boot;

    let mut lines = vec![
        format!("Name:        {}", m.name),
        format!("UUID:        {}", m.uuid),
        format!("OS:          {} / {}", m.os_type, m.os_version),
        format!("Type:        {}", m.machine_type),
    ];
    if !m.description.is_empty() {
        lines.push(format!("Description: {}", m.description));
    }
    lines.extend([
        format!("State:       {:?}", m.state),
        format!("Folder:      {}", m.path.display()),
        format!("Config:      {}", m.config_path.display()),
        format!("RAM:         {} MB", m.ram_mb),
        format!(
            "CPU:         {} x{} ({} sockets, {} cores, {} threads, max hotplug {})",
            cpu.cpu_type,
            cpu.cpu_count,
            cpu.socket_count,
            cpu.cores_per_socket,
            cpu.threads_per_core,
            cpu.max_hotpluggable_cpus
        ),
    ]);
    if cpu.topology_total() != cpu.cpu_count {
        lines.push(format!(
            "             note: topology gives {} CPUs",
            cpu.topology_total()
        ));
    }
    lines.extend([
        format!("GPU:         {} (keyboard {})", m.gpu.gpu_type, m.gpu.keyboard_layout),
        format!("Network:     {}", if m.use_network { "on" } else { "off" }),
        format!(
            "Audio:       {} [{}]",
            m.host_sound_system,
            m.sound_cards.join(", ")
        ),
        format!("Accel:       {}", m.accelerators.join(", ")),
        format!(
            "Boot order:  {}{}",
            boot.boot_order.join(", "),
            if boot.boot_menu_enabled { " (menu)" } else { "" }
        ),
    ]);
    if boot.kernel_boot.enabled {
        let k = &boot.kernel_boot;
        lines.push(format!(
            "Kernel:      {} initrd={} args={}",
            k.kernel_path, k.initrd_path, k.kernel_args
        ));
    }
    lines.extend(m.media.iter().map(|media| {
        let id = media.uuid.map(|u| u.to_string()).unwrap_or_else(|| "-".into());
        format!(
            "Media:       {} {} ({}, {}) {}",
            media.media_type,
            media.path.display(),
            media.drive_interface,
            media.name,
            id
        )
    }));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
