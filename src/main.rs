use anyhow::Result;
use clap::Parser;
use qtemu::cli::commands::{Cli, Cmd};
use qtemu::cli::completions::{render_man_page, write_completions};
use qtemu::cli::present::{format_machine, format_records, to_report};
use qtemu::config::catalog::OsType;
use qtemu::vm::codec::encode;
use qtemu::vm::creator::CreateParams;
use qtemu::{MachineManager, Settings};
use std::io::{self, Write};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_tracing(&cli.log);

    match cli.cmd {
        Cmd::Completions { shell } => {
            write_completions(shell, &mut io::stdout());
            return Ok(());
        }
        Cmd::ManPage => {
            print!("{}", render_man_page()?);
            return Ok(());
        }
        Cmd::OsTypes => {
            for os in OsType::ALL {
                println!("{}: {}", os, os.versions().join(", "));
            }
            return Ok(());
        }
        _ => {}
    }

    let settings = Settings::load()
        .map_err(to_report)?
        .with_overrides(cli.data_folder, cli.machine_path);
    let manager = MachineManager::new(settings);

    match cli.cmd {
        Cmd::Create {
            name,
            os_type,
            os_version,
            description,
            machine_type,
            ram,
            cpu_type,
            cpus,
            sockets,
            cores,
            threads,
            max_hot_cpus,
            gpu,
            keyboard,
            no_network,
            host_sound,
            audio,
            accel,
            disks,
            cdroms,
            boot_order,
            boot_menu,
            kernel,
            initrd,
            kernel_args,
        } => {
            let os: OsType = os_type.parse().map_err(anyhow::Error::msg)?;
            let os_version = match os_version {
                Some(v) => os.find_version(&v).map(str::to_string).unwrap_or_else(|| {
                    tracing::warn!("'{v}' is not a known {os} version");
                    v
                }),
                None => os.default_version().to_string(),
            };

            let mut params = CreateParams::named(name);
            params.description = description;
            params.os_type = os.label().to_string();
            params.os_version = os_version;
            params.machine_type = machine_type;
            params.ram_mb = ram;
            params.cpu_type = cpu_type;
            params.cpus = cpus;
            params.sockets = sockets;
            params.cores = cores;
            params.threads = threads;
            params.max_hot_cpus = max_hot_cpus;
            params.gpu_type = gpu;
            params.keyboard_layout = keyboard;
            params.use_network = !no_network;
            params.host_sound_system = host_sound;
            params.sound_cards = audio;
            if !accel.is_empty() {
                params.accelerators = accel;
            }
            params.disks = disks;
            params.cdroms = cdroms;
            params.boot_order = boot_order;
            params.boot_menu = boot_menu;
            params.kernel = kernel;
            params.initrd = initrd;
            params.kernel_args = kernel_args;

            let machine = manager.create_machine(params).map_err(to_report)?;
            println!(
                "Created machine '{}' ({}) at {}",
                machine.name,
                machine.uuid,
                machine.path.display()
            );
        }
        Cmd::List => {
            let records = manager.list_machines().map_err(to_report)?;
            if records.is_empty() {
                println!("No machines registered");
            } else {
                print!("{}", format_records(&records));
            }
        }
        Cmd::Show { uuid, json } => {
            let machine = manager.load_machine(&uuid).map_err(to_report)?;
            if json {
                println!("{}", encode(&machine).map_err(to_report)?);
            } else {
                print!("{}", format_machine(&machine));
            }
        }
        Cmd::Delete { uuid, force } => {
            if !force && !confirm_delete(&manager, &uuid)? {
                println!("Deletion cancelled.");
                return Ok(());
            }
            let path = manager.delete_machine(&uuid).map_err(to_report)?;
            println!("Successfully deleted machine {} ({})", uuid, path.display());
        }
        // handled before settings are loaded
        Cmd::Completions { .. } | Cmd::ManPage | Cmd::OsTypes => {}
    }

    Ok(())
}

fn confirm_delete(manager: &MachineManager, uuid: &str) -> Result<bool> {
    let record = manager
        .registry()
        .find(uuid)
        .map_err(to_report)?
        .ok_or_else(|| to_report(qtemu::MachineError::NotFound { uuid: uuid.to_string() }))?;

    println!(
        "About to delete machine '{}':",
        record.name.as_deref().unwrap_or(uuid)
    );
    println!("  Folder: {}", record.path.display());
    println!();
    print!("Are you sure you want to delete this machine? [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn install_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
