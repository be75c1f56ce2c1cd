//! Minereset - timed regeneration of rectangular mining regions
//!
//! A mine is an axis-aligned block box with a weighted material composition.
//! On a per-minute countdown the region is evacuated and refilled off the
//! caller's thread, with warnings broadcast ahead of each reset.

pub mod core;
pub mod math;
pub mod block;
pub mod world;
pub mod mine;
pub mod reset;
pub mod schedule;
