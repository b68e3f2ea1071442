//! Files fed to the external watchdog.
//!
//! A supervisor outside the service watches two files: the running file
//! says whether the equipment is powered, the activity file records the
//! last service event so a crash can be told apart from a clean exit.

use std::fmt;
use std::path::PathBuf;

use tracing::warn;

use crate::config::WatchdogSettings;

/// Service events written to the activity file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    ServiceExit,
    ServiceInterrupt,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::ServiceExit => write!(f, "service_exit"),
            Activity::ServiceInterrupt => write!(f, "service_interrupt"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Watchdog {
    running_file: PathBuf,
    activity_file: PathBuf,
}

impl Watchdog {
    pub fn new(settings: &WatchdogSettings) -> Self {
        Self {
            running_file: settings.running_file.clone(),
            activity_file: settings.activity_file.clone(),
        }
    }

    /// Write `True` or `False` to the running file.
    pub fn set_running(&self, running: bool) {
        let text = if running { "True\n" } else { "False\n" };
        if let Err(e) = std::fs::write(&self.running_file, text) {
            warn!("Failed to write {}: {}", self.running_file.display(), e);
        }
    }

    pub fn record(&self, activity: Activity) {
        if let Err(e) = std::fs::write(&self.activity_file, format!("{activity}\n")) {
            warn!("Failed to write {}: {}", self.activity_file.display(), e);
        }
    }
}
