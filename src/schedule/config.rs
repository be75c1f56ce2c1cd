//! Scheduler configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;

/// Settings for the automatic reset driver
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Real-time length of one countdown tick in seconds (a minute in the host)
    pub tick_interval_secs: u64,
    /// Mine store location
    pub store_path: PathBuf,
    /// Save the store after every tick so clocks survive restarts
    pub autosave: bool,
    /// Fixed RNG seed for fills (reproducible layouts); random when unset
    pub fill_seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            store_path: PathBuf::from("mines.json"),
            autosave: true,
            fill_seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Load from a JSON file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Tick length, never shorter than a millisecond
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs).max(Duration::from_millis(1))
    }
}
