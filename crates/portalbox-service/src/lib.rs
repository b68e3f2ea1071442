//! PortalBox badge box service.
//!
//! Wires the access state machine to the box hardware and the backend:
//!
//! - [`config`]: TOML configuration with defaults for every key
//! - [`identity`]: the box's MAC address, used to find its equipment profile
//! - [`facade`]: card reads, relay, and the light and sound workers
//! - [`service`]: setup and the 100 ms control loop
//! - [`emulator`]: mock peripherals and a console to play the user
//! - [`drivers`]: line-protocol light and sound drivers
//!
//! ```no_run
//! use portalbox_backend::{InMemoryBackend, LogNotifier};
//! use portalbox_service::{PortalBoxService, ServiceConfig, emulated_peripherals};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> portalbox_service::Result<()> {
//! let config = ServiceConfig::default();
//! let (peripherals, _handles) = emulated_peripherals(&config.display)?;
//! let backend = InMemoryBackend::new(config.backend.clone());
//! let service = PortalBoxService::new(config, backend, LogNotifier, peripherals, CancellationToken::new());
//! let cause = service.run().await;
//! println!("stopped: {cause:?}");
//! # Ok(())
//! # }
//! ```

mod cards;
pub mod config;
pub mod drivers;
pub mod emulator;
pub mod error;
pub mod facade;
pub mod identity;
pub mod service;
pub mod signal;
pub mod watchdog;

pub use config::{HardwareMode, ServiceConfig};
pub use drivers::{run_light_driver, run_sound_driver};
pub use emulator::{EmulatorHandles, emulated_peripherals, run_console};
pub use error::{ConfigError, Result, ServiceError};
pub use facade::{HardwareFacade, Peripherals};
pub use service::{PortalBoxService, ShutdownCause};
pub use signal::wait_for_shutdown_signal;
pub use watchdog::{Activity, Watchdog};
