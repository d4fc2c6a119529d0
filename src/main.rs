use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use fazan_control::config::TransportConfig;
use fazan_control::device::Fazan19Device;
use fazan_control::logging::setup_logging;
use fazan_control::transport::{SerialTransport, TcpTransport, Transport};
use fazan_control::{RadioConfig, RadioError};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "/etc/fazan-control.json")]
    config: PathBuf,

    /// Dump default config and exit
    #[arg(long = "dump-default-config")]
    dump_default: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Read and print the full device status
    Status,
    /// Read and print active alarms
    Alarms,
    /// Tune the transceiver to a frequency in MHz
    SetFrequency { freq_mhz: f64 },
    /// Enable or disable the squelch
    Squelch {
        #[arg(value_parser = parse_switch)]
        state: bool,
        /// Squelch threshold, 0-15
        #[arg(short, long, default_value_t = 8)]
        level: u8,
    },
    /// Key or release the transmitter
    Ptt {
        #[arg(value_parser = parse_switch)]
        state: bool,
    },
    /// Read the device identification string
    Id,
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("expected 'on' or 'off', got '{}'", other)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.common.dump_default {
        let config = RadioConfig::default();
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let config = if cli.common.config.exists() {
        let content = std::fs::read_to_string(&cli.common.config)?;
        let config: RadioConfig = serde_json::from_str(&content)?;
        config.validate()?;
        config
    } else {
        eprintln!(
            "Config {} not found, using defaults (try --dump-default-config)",
            cli.common.config.display()
        );
        RadioConfig::default()
    };

    setup_logging(&config.log)?;
    info!("Loaded config from {}", cli.common.config.display());

    match &config.transport {
        TransportConfig::Serial(serial) => {
            let transport = SerialTransport::new(serial.clone());
            run(transport, &config, cli.command)?;
        }
        TransportConfig::Tcp(tcp) => {
            let transport = TcpTransport::new(tcp.clone());
            run(transport, &config, cli.command)?;
        }
    }

    Ok(())
}

fn run<T: Transport>(
    transport: T,
    config: &RadioConfig,
    command: Command,
) -> Result<(), RadioError> {
    let mut device = Fazan19Device::new(transport, config.device.clone());
    device.open()?;

    let result = execute(&mut device, command);
    device.close()?;
    result
}

fn execute<T: Transport>(
    device: &mut Fazan19Device<T>,
    command: Command,
) -> Result<(), RadioError> {
    match command {
        Command::Status => {
            let status = device.read_status()?;
            println!("Frequency:   {:.3} MHz", status.frequency_mhz);
            println!(
                "Transmitter: {}",
                if status.transmitting { "keyed" } else { "idle" }
            );
            println!(
                "Squelch:     {}",
                if status.squelch_enabled { "on" } else { "off" }
            );
            println!("Control:     {:?}", status.control_mode);
            println!("Work mode:   {:?}", status.work_mode);
            println!("Line:        {:?}", status.line_type);
            println!("Power:       level {}", status.power_level);
            println!("Supply:      {:.1} V", status.voltage_24v);
            println!("Temperature: {:.1} C", status.temperature);
            println!("Signal:      {}", status.signal_level);
            println!("Hours:       {}", status.operating_hours);
        }
        Command::Alarms => {
            let alarms = device.read_alarms()?;
            if alarms.is_empty() {
                println!("No active alarms");
            } else {
                for alarm in alarms {
                    println!("[{}] 0x{:04X} {}", alarm.severity, alarm.code, alarm.message);
                }
            }
        }
        Command::SetFrequency { freq_mhz } => {
            device.set_frequency(freq_mhz)?;
            let read_back = device.get_frequency()?;
            println!("Tuned to {:.3} MHz", read_back);
        }
        Command::Squelch { state, level } => {
            device.set_squelch(state, level)?;
            println!("Squelch {}", if state { "on" } else { "off" });
        }
        Command::Ptt { state } => {
            device.set_ptt(state)?;
            println!("PTT {}", if state { "on" } else { "off" });
        }
        Command::Id => {
            let id = device.read_device_id()?;
            println!("{}", id);
        }
    }

    Ok(())
}
