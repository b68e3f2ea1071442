//! `portalbox`: the badge box service and its standalone effect drivers.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use portalbox_backend::{InMemoryBackend, LogNotifier};
use portalbox_core::constants::DEFAULT_LED_COUNT;
use portalbox_hardware::apa102::WriterStrip;
use portalbox_hardware::mock::MockBuzzer;
use portalbox_hardware::{ColorOrder, LedStrip};
use portalbox_service::config::DEFAULT_CONFIG_PATH;
use portalbox_service::{
    HardwareMode, PortalBoxService, ServiceConfig, ShutdownCause, emulated_peripherals, run_console,
    run_light_driver, run_sound_driver, wait_for_shutdown_signal,
};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A pending console read on stdin cannot be cancelled; the runtime only
/// waits this long for it at exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "portalbox")]
#[command(about = "Badge-operated power control for shop equipment", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the badge box service (default)
    Run,

    /// Drive an LED strip from light commands on stdin
    LightDriver {
        /// Number of LEDs on the strip
        #[arg(long, default_value_t = DEFAULT_LED_COUNT)]
        leds: usize,

        /// Device node to write APA102 frames to; frames are discarded if unset
        #[arg(long)]
        device: Option<PathBuf>,

        /// Byte order of the strip's color channels
        #[arg(long, default_value_t = ColorOrder::Brg)]
        color_order: ColorOrder,
    },

    /// Drive an emulated buzzer from sound commands on stdin
    SoundDriver,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

fn init_logging(verbose: bool) {
    // prefix match: covers every portalbox_* crate
    let default_filter = if verbose { "portalbox=debug" } else { "portalbox=info" };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(()) => info!("Termination signal received"),
            Err(e) => error!("Cannot listen for termination signals: {}", e),
        }
        signal_cancel.cancel();
    });

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_service(&cli.config, cancel).await,
        Commands::LightDriver {
            leds,
            device,
            color_order,
        } => {
            let strip: Box<dyn LedStrip> = match device {
                Some(path) => {
                    let file = OpenOptions::new()
                        .write(true)
                        .open(&path)
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    Box::new(WriterStrip::new(file, leds, color_order)?)
                }
                None => Box::new(WriterStrip::new(std::io::sink(), leds, color_order)?),
            };
            run_light_driver(tokio::io::stdin(), tokio::io::stdout(), strip, cancel).await?;
            Ok(())
        }
        Commands::SoundDriver => {
            let (buzzer, _handle) = MockBuzzer::new();
            run_sound_driver(tokio::io::stdin(), tokio::io::stdout(), Box::new(buzzer), cancel).await?;
            Ok(())
        }
    }
}

async fn run_service(config_path: &std::path::Path, cancel: CancellationToken) -> Result<()> {
    info!("PortalBox v{}", portalbox_core::VERSION);

    let config = ServiceConfig::load_or_default(config_path)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
    let (peripherals, handles) = emulated_peripherals(&config.display).context("Failed to set up peripherals")?;

    if config.hardware == HardwareMode::Emulated {
        info!("Emulated hardware: type present <uid>, remove, press or quit");
        tokio::spawn(run_console(BufReader::new(tokio::io::stdin()), handles, cancel.clone()));
    }

    let backend = InMemoryBackend::new(config.backend.clone());
    let service = PortalBoxService::new(config, backend, LogNotifier, peripherals, cancel);

    match service.run().await {
        ShutdownCause::SetupFailed => bail!("Setup failed, see the log above"),
        cause => {
            info!("Stopped ({:?})", cause);
            Ok(())
        }
    }
}
