use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use tracing::info;

use modbus_rtu::{run_slave, setup_logging, SlaveConfig};

/// Memory-backed MODBUS RTU slave bound to a serial device.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Station address to answer on (1..=247)
    #[arg(short = 'a', long)]
    address: Option<u8>,

    /// Serial device path
    #[arg(short = 'd', long)]
    device: Option<String>,

    /// Baud rate
    #[arg(short = 'r', long)]
    rate: Option<u32>,

    /// Parity: E, O or N
    #[arg(short = 'p', long)]
    parity: Option<String>,

    /// Custom 1.5t interval in microseconds
    #[arg(short = 't', long = "timeout-1t5-us")]
    timeout_1t5_us: Option<u64>,

    /// Custom 3.5t interval in microseconds
    #[arg(short = 'T', long = "timeout-3t5-us")]
    timeout_3t5_us: Option<u64>,

    /// Hex-dump transferred frames, truncated to this many bytes
    /// (0 disables the dumps)
    #[arg(short = 'D', long = "debug-bytes")]
    debug_bytes: Option<usize>,

    /// Path to a config file (flags below override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dump default config and exit
    #[arg(long = "dump-default-config")]
    dump_default: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.dump_default {
        println!("{}", serde_json::to_string_pretty(&SlaveConfig::default())?);
        return Ok(());
    }

    let mut config: SlaveConfig = match &cli.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => SlaveConfig::default(),
    };

    if let Some(address) = cli.address {
        config.address = address;
    }
    if let Some(device) = cli.device {
        config.rtu.device = device;
    }
    if let Some(rate) = cli.rate {
        config.rtu.baud_rate = rate;
    }
    if let Some(parity) = &cli.parity {
        config.rtu.parity = parity.parse()?;
    }
    if cli.timeout_1t5_us.is_some() {
        config.timing.t1_5_us = cli.timeout_1t5_us;
    }
    if cli.timeout_3t5_us.is_some() {
        config.timing.t3_5_us = cli.timeout_3t5_us;
    }
    if let Some(trace_bytes) = cli.debug_bytes {
        config.logging.trace_bytes = trace_bytes;
    }

    // rejects a missing address or device path with a nonzero exit
    config.validate()?;
    setup_logging(&config.logging)?;

    let stop = AtomicBool::new(false);
    run_slave(&config, &stop)?;

    info!("orderly shutdown");
    Ok(())
}
