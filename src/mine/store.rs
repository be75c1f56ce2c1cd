//! JSON file store for mine definitions.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::mine::registry::{LoadReport, MineRegistry};
use crate::world::WorldResolver;

const STORE_VERSION: u32 = 1;

/// Store file contents (serialized as JSON for easy inspection)
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile<T> {
    version: u32,
    mines: Vec<T>,
}

/// Mine definitions persisted to a single JSON file
#[derive(Clone, Debug)]
pub struct MineStore {
    path: PathBuf,
}

impl MineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every mine into the registry; a missing file loads nothing
    pub async fn load(&self, registry: &mut MineRegistry, worlds: &dyn WorldResolver) -> Result<LoadReport> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(e) => return Err(e.into()),
        };
        self.load_bytes(&bytes, registry, worlds)
    }

    /// Synchronous variant of [`load`](Self::load)
    pub fn load_sync(&self, registry: &mut MineRegistry, worlds: &dyn WorldResolver) -> Result<LoadReport> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(e) => return Err(e.into()),
        };
        self.load_bytes(&bytes, registry, worlds)
    }

    fn load_bytes(&self, bytes: &[u8], registry: &mut MineRegistry, worlds: &dyn WorldResolver) -> Result<LoadReport> {
        let file: StoreFile<serde_json::Value> = serde_json::from_slice(bytes)?;
        if file.version != STORE_VERSION {
            log::warn!("Mine store {} has version {}, expected {}", self.path.display(), file.version, STORE_VERSION);
        }
        let report = registry.load_values(file.mines, worlds);
        log::info!(
            "Loaded {} mine(s) from {} ({} failed)",
            report.loaded.len(),
            self.path.display(),
            report.failed.len()
        );
        Ok(report)
    }

    fn encode(registry: &MineRegistry) -> Result<Vec<u8>> {
        let file = StoreFile { version: STORE_VERSION, mines: registry.records() };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    /// Write every mine, replacing the file atomically
    pub async fn save(&self, registry: &MineRegistry) -> Result<()> {
        let bytes = Self::encode(registry)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    /// Synchronous variant of [`save`](Self::save)
    pub fn save_sync(&self, registry: &MineRegistry) -> Result<()> {
        let bytes = Self::encode(registry)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
