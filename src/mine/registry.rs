//! Owner of every mine's state.

use std::collections::BTreeMap;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mine::record::MineRecord;
use crate::mine::state::MineState;
use crate::world::{Location, WorldResolver};

/// Result of loading persisted mines
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names of mines that came online
    pub loaded: Vec<String>,
    /// Mines that failed validation, by name (or position when unnamed)
    pub failed: Vec<(String, Error)>,
}

/// All mines, keyed by name
#[derive(Debug, Default)]
pub struct MineRegistry {
    mines: BTreeMap<String, MineState>,
}

impl MineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new mine; names are unique
    pub fn define(&mut self, mine: MineState) -> Result<()> {
        if self.mines.contains_key(mine.name()) {
            return Err(Error::DuplicateMine(mine.name().to_string()));
        }
        log::info!("Defined mine '{}' in '{}' ({} cells)", mine.name(), mine.world(), mine.bounds().volume());
        self.mines.insert(mine.name().to_string(), mine);
        Ok(())
    }

    /// Delete a mine, returning its final state
    pub fn remove(&mut self, name: &str) -> Result<MineState> {
        self.mines.remove(name).ok_or_else(|| Error::UnknownMine(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&MineState> {
        self.mines.get(name).ok_or_else(|| Error::UnknownMine(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut MineState> {
        self.mines.get_mut(name).ok_or_else(|| Error::UnknownMine(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mines.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }

    /// Mines in name order
    pub fn iter(&self) -> impl Iterator<Item = &MineState> {
        self.mines.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MineState> {
        self.mines.values_mut()
    }

    /// First mine (by name) containing a location
    pub fn find_containing(&self, location: &Location) -> Option<&MineState> {
        self.mines.values().find(|m| m.contains(location))
    }

    /// Validate and add persisted mines one by one.
    ///
    /// A bad record keeps only that mine offline.
    pub fn load_values(&mut self, values: Vec<serde_json::Value>, worlds: &dyn WorldResolver) -> LoadReport {
        let mut report = LoadReport::default();

        for (index, value) in values.into_iter().enumerate() {
            let label = value
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", index));

            let result = MineRecord::decode(value)
                .and_then(|record| record.into_state(worlds))
                .and_then(|mine| self.define(mine));

            match result {
                Ok(()) => report.loaded.push(label),
                Err(e) => {
                    log::error!("Mine '{}' failed to load: {}", label, e);
                    report.failed.push((label, e));
                }
            }
        }

        report
    }

    /// Persistable records in name order
    pub fn records(&self) -> Vec<MineRecord> {
        self.mines.values().map(MineRecord::from_state).collect()
    }
}
