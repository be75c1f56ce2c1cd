//! Block identities used by compositions and the block sink

pub mod spec;

pub use spec::BlockSpec;
