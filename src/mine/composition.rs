//! Weighted block composition and its cumulative probability partition.

use crate::block::BlockSpec;
use crate::core::error::Error;
use crate::core::types::Result;

/// Weighted table of block types used to regenerate a mine.
///
/// Entries keep insertion order, so a partition derived from an unchanged
/// composition is always identical.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Composition {
    entries: Vec<(BlockSpec, f64)>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a composition from pairs, rejecting negative or non-finite weights.
    ///
    /// A block listed twice keeps its first position and its last weight.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (BlockSpec, f64)>) -> Result<Self> {
        let mut composition = Self::new();
        for (block, weight) in pairs {
            composition.set(block, weight)?;
        }
        Ok(composition)
    }

    /// Set the weight of a block, replacing any existing weight in place.
    pub fn set(&mut self, block: BlockSpec, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight { block: block.to_string(), weight });
        }
        match self.entries.iter_mut().find(|(b, _)| *b == block) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((block, weight)),
        }
        Ok(())
    }

    /// Remove a block, returning its weight if it was present
    pub fn remove(&mut self, block: &BlockSpec) -> Option<f64> {
        let index = self.entries.iter().position(|(b, _)| b == block)?;
        Some(self.entries.remove(index).1)
    }

    pub fn weight(&self, block: &BlockSpec) -> Option<f64> {
        self.entries.iter().find(|(b, _)| b == block).map(|(_, w)| *w)
    }

    /// Sum of the raw weights
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockSpec, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Derive the cumulative partition for sampling.
    ///
    /// Under-full tables are padded with air up to 1.0; over-full tables are
    /// divided by their true total.
    pub fn partition(&self) -> Partition {
        let mut weights = self.entries.clone();
        let mut total = self.total();
        if total < 1.0 {
            weights.push((BlockSpec::AIR, 1.0 - total));
            total = 1.0;
        }

        let mut cumulative = 0.0;
        let mut entries = Vec::with_capacity(weights.len());
        for (block, weight) in weights {
            cumulative += weight / total;
            entries.push(CompositionEntry { block, threshold: cumulative });
        }

        Partition { entries }
    }
}

/// A block and the upper bound of its cumulative probability band
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositionEntry {
    pub block: BlockSpec,
    pub threshold: f64,
}

/// Immutable cumulative distribution over blocks.
///
/// Thresholds never decrease and the last one is 1.0 within floating-point error.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    entries: Vec<CompositionEntry>,
}

impl Partition {
    pub fn entries(&self) -> &[CompositionEntry] {
        &self.entries
    }

    /// Index of the entry selected by a uniform draw `r` in [0, 1).
    ///
    /// Picks the first entry whose threshold is >= `r`; a draw above the last
    /// threshold (rounding) falls to the last entry.
    pub fn select_index(&self, r: f64) -> usize {
        self.entries
            .iter()
            .position(|e| e.threshold >= r)
            .unwrap_or(self.entries.len() - 1)
    }

    /// Block selected by a uniform draw `r` in [0, 1)
    pub fn sample(&self, r: f64) -> BlockSpec {
        self.entries[self.select_index(r)].block
    }

    /// Draw a block with the given RNG
    pub fn sample_with<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> BlockSpec {
        self.sample(rng.random::<f64>())
    }
}
