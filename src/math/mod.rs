//! Mathematical utilities

pub mod aabb;
pub mod facing;

pub use aabb::BlockAabb;
pub use facing::Facing;
