//! Bring-up tool for an ESP8266 radio on a serial port.
//!
//! Resets the module, configures it as a soft access point running a TCP
//! server, and logs every event it reports until interrupted.

mod motor;

use anyhow::{Context, Result};
use atlink_core::ModemConfig;
use atlink_hardware::{Delay, SerialTransport, TokioDelay};
use atlink_modem::Modem;
use atlink_protocol::{
    AtCommand, CommandParams, Encryption, MuxMode, Operation, ServerConfig, SoftApConfig,
    WifiMode,
};
use clap::{Parser, ValueEnum};
use motor::MotorDecoder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Soft-AP security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Security {
    Open,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
}

impl From<Security> for Encryption {
    fn from(security: Security) -> Self {
        match security {
            Security::Open => Encryption::Open,
            Security::WpaPsk => Encryption::WpaPsk,
            Security::Wpa2Psk => Encryption::Wpa2Psk,
            Security::WpaWpa2Psk => Encryption::WpaWpa2Psk,
        }
    }
}

/// ESP8266 soft-AP bring-up over AT commands
#[derive(Parser, Debug)]
#[command(name = "atlink", version, about, long_about = None)]
struct Args {
    /// Serial port the radio is attached to
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UART speed, overrides the configuration file
    #[arg(short, long)]
    baud: Option<u32>,

    /// Access point name
    #[arg(long, default_value = "atlink")]
    ssid: String,

    /// Access point password (ignored for an open network)
    #[arg(long, default_value = "atlink-secret")]
    password: String,

    /// Wi-Fi channel
    #[arg(long, default_value_t = 5)]
    channel: u8,

    #[arg(long, value_enum, default_value_t = Security::Wpa2Psk)]
    security: Security,

    /// TCP server port
    #[arg(long, default_value_t = 333)]
    server_port: u16,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn load_config(&self) -> Result<ModemConfig> {
        let mut config = match &self.config {
            Some(path) => ModemConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ModemConfig::default(),
        };
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        config.validate()?;
        Ok(config)
    }

    /// Soft-AP settings, checked before anything reaches the radio.
    fn soft_ap(&self) -> Result<SoftApConfig> {
        let config = SoftApConfig {
            ssid: self.ssid.clone(),
            password: self.password.clone(),
            channel: self.channel,
            encryption: self.security.into(),
        };
        config.validate().context("invalid soft-AP settings")?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Queue the soft-AP and server configuration.
fn enqueue_bring_up<T, D>(modem: &Modem<T, D>, soft_ap: &SoftApConfig, port: u16) -> Result<()>
where
    T: atlink_hardware::Transport,
    D: Delay,
{
    modem.enqueue(AtCommand::WifiMode, Operation::Set, WifiMode::SoftAp.into())?;
    modem.enqueue(AtCommand::SoftApCurrent, Operation::Set, soft_ap.clone().into())?;
    modem.enqueue(AtCommand::Multiplex, Operation::Set, MuxMode::Multiple.into())?;
    modem.enqueue(AtCommand::Server, Operation::Set, ServerConfig::create(port).into())?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.load_config()?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    let soft_ap = args.soft_ap()?;

    let serial = SerialTransport::open(&args.port, config.baud_rate)
        .with_context(|| format!("opening {}", args.port))?;
    let modem = Arc::new(Modem::new(serial, TokioDelay::new(), &config)?);
    info!(port = %args.port, baud = config.baud_rate, "radio link open");

    let (reset_tx, mut reset_rx) = mpsc::unbounded_channel();
    modem.register_reset_detected(move || {
        let _ = reset_tx.send(());
    });
    modem.register_command_sent(|command| info!(%command, "confirmed"));
    modem.register_connection_changed(|id, status| info!(connection = %id, %status, "client"));

    let mut decoder = MotorDecoder::new();
    modem.register_data_received(move |data| {
        if data.is_truncated() {
            warn!(
                connection = %data.connection_id,
                declared = data.declared_length,
                kept = data.data.len(),
                "payload truncated"
            );
        }
        info!(
            connection = %data.connection_id,
            payload = %String::from_utf8_lossy(&data.data).escape_debug(),
            "data"
        );
        for request in decoder.feed(&data.data) {
            info!(?request, "motor request");
        }
    });

    let cancel = CancellationToken::new();
    let receiver = modem.spawn_receive_task(cancel.clone());
    let dispatcher = {
        let modem = Arc::clone(&modem);
        let cancel = cancel.clone();
        tokio::spawn(async move { modem.run_dispatch_loop(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(config.startup_delay_ms)).await;
    modem.enqueue(AtCommand::Reset, Operation::Execute, CommandParams::None)?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for ctrl-c")?;
                info!("shutting down");
                break;
            }
            Some(()) = reset_rx.recv() => {
                if let Err(e) = enqueue_bring_up(&modem, &soft_ap, args.server_port) {
                    error!(error = %e, "bring-up not queued");
                }
            }
        }
    }

    cancel.cancel();
    modem.delay().stop();
    let (receiver, dispatcher) = tokio::join!(receiver, dispatcher);
    receiver.context("receive task")?;
    dispatcher.context("dispatch task")?;
    Ok(())
}
