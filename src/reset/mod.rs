//! Reset cycle: occupant relocation, region filling and completion events.

pub mod events;
pub mod filler;
pub mod relocate;
pub mod controller;

pub use controller::{ResetCallback, ResetController, ResetTicket};
pub use events::{ChannelEventSink, EventSink, LogEventSink, MineEvent, RecordingEventSink};
pub use filler::{FillHandle, FillJob, FillOptions, FillReport, RegionFiller};
pub use relocate::{Direction, OccupantRelocator, Relocation};
