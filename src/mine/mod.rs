//! Mine definitions: composition, state, persistence and the registry.

pub mod composition;
pub mod state;
pub mod record;
pub mod registry;
pub mod store;

pub use composition::{Composition, CompositionEntry, Partition};
pub use record::MineRecord;
pub use registry::{LoadReport, MineRegistry};
pub use state::MineState;
pub use store::MineStore;
