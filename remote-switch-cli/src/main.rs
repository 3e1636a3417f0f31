use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use remote_switch::app::DeviceRegistry;
use remote_switch::config::{Config, SwitchOptions};
use remote_switch::hal::{Connector, Switch};
use remote_switch::svc::PigpioConnector;

use crate::report::SwitchReport;

mod report;

/// Switch remote Raspberry Pi GPIO lines through their pigpio daemon
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "remote-switch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the configured switches without connecting to them
    List,
    /// Connect to every switch and print its state
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Turn a switch on, by name or `host:pin`
    On { switch: String },
    /// Turn a switch off, by name or `host:pin`
    Off { switch: String },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;

    adjust_options(&args.command, &mut config.switch);

    let connector = PigpioConnector::from(&config.pigpio);

    log::info!("Create registry");
    let mut registry = DeviceRegistry::from_config(&config, connector);

    for rejected in registry.rejected() {
        let port = rejected.port.as_deref().unwrap_or("*");
        eprintln!("ignored {} port {}: {}", rejected.host, port, rejected.error);
    }

    match args.command {
        Command::List => {
            let reports: Vec<_> = registry.switches().iter().map(SwitchReport::from).collect();
            report::print_table(&reports, false);
        }
        Command::Status { json } => {
            let reports: Vec<_> = registry.switches().iter().map(SwitchReport::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                report::print_table(&reports, true);
            }
        }
        Command::On { switch } => change_state(&mut registry, &switch, true)?,
        Command::Off { switch } => change_state(&mut registry, &switch, false)?,
    }

    Ok(())
}

/// Only a status request opens every line, and it must not drive any of them.
/// Actions open the one line they use.
fn adjust_options(command: &Command, options: &mut SwitchOptions) {
    let status = matches!(command, Command::Status { .. });
    options.connect_on_setup = status;
    if status {
        options.initial_value = None;
    }
}

fn change_state<C: Connector + Clone>(
    registry: &mut DeviceRegistry<C>,
    selector: &str,
    on: bool,
) -> anyhow::Result<()> {
    let switch = registry
        .find_mut(selector)
        .ok_or_else(|| anyhow!("No switch named `{selector}`"))?;

    if on {
        switch.turn_on()?;
    } else {
        switch.turn_off()?;
    }

    println!("{}: {}", switch.name(), switch.state());
    Ok(())
}
