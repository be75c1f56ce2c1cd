//! Structured engine events and the sinks that receive them.
//!
//! The scheduler and reset controller never format messages; hosts turn
//! these events into broadcasts, chat lines or log records.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::reset::filler::FillReport;
use crate::world::OccupantId;

/// Something a host may want to announce or record
#[derive(Clone, Debug, PartialEq)]
pub enum MineEvent {
    /// An automatic reset is `minutes` away
    Warning { mine: String, minutes: u32 },
    /// The countdown reached zero and an automatic reset is starting
    AutoReset { mine: String },
    /// An occupant was moved to the computed edge point (no configured teleport point)
    Evacuated { mine: String, occupant: OccupantId },
    /// A fill finished and the sink applied every write
    ResetCompleted { mine: String, report: FillReport },
    /// A reset cycle was aborted
    ResetFailed { mine: String, reason: String },
}

impl MineEvent {
    pub fn mine(&self) -> &str {
        match self {
            MineEvent::Warning { mine, .. }
            | MineEvent::AutoReset { mine }
            | MineEvent::Evacuated { mine, .. }
            | MineEvent::ResetCompleted { mine, .. }
            | MineEvent::ResetFailed { mine, .. } => mine,
        }
    }
}

/// Receiver of engine events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MineEvent);
}

/// Writes every event to the log
#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: MineEvent) {
        match event {
            MineEvent::Warning { mine, minutes } => {
                log::info!("Mine '{}' resets in {} minute(s)", mine, minutes);
            }
            MineEvent::AutoReset { mine } => log::info!("Mine '{}' is resetting", mine),
            MineEvent::Evacuated { mine, occupant } => {
                log::info!("Moved {} out of mine '{}' while it resets", occupant, mine);
            }
            MineEvent::ResetCompleted { mine, report } => {
                log::info!(
                    "Mine '{}' reset: {} cells written, {} skipped",
                    mine, report.cells_written, report.cells_skipped
                );
            }
            MineEvent::ResetFailed { mine, reason } => {
                log::error!("Mine '{}' reset failed: {}", mine, reason);
            }
        }
    }
}

/// Forwards events over an unbounded tokio channel
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<MineEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: MineEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<MineEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<MineEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: MineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
