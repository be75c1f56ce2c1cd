//! Region filling: walk every cell of a mine and write sampled blocks.
//!
//! The cell loop runs on tokio's blocking pool so large volumes never stall
//! the scheduling context. Completion is signalled exactly once, after the
//! sink has applied every write.

use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::block::BlockSpec;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::math::BlockAabb;
use crate::mine::composition::Partition;
use crate::world::{BlockSink, SinkError};

/// Per-fill policies
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillOptions {
    /// Only write cells that are currently empty
    pub fill_mode_only: bool,
    /// Leave cells of this block type untouched (matched by type id)
    pub ignore_block: Option<BlockSpec>,
    /// Force this block on the top layer
    pub surface: Option<BlockSpec>,
    /// Fixed RNG seed; random per fill when unset
    pub seed: Option<u64>,
}

/// Immutable snapshot of everything a fill needs
#[derive(Clone, Debug)]
pub struct FillJob {
    pub mine: String,
    pub bounds: BlockAabb,
    pub partition: Partition,
    pub options: FillOptions,
}

/// Counters for a completed fill
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillReport {
    pub cells_visited: u64,
    pub cells_written: u64,
    pub cells_skipped: u64,
    pub surface_cells: u64,
}

/// Walk every cell of the job and issue writes to the sink.
///
/// Stops at the first rejected write; writes already issued stay applied.
pub fn fill_cells<R: Rng + ?Sized>(job: &FillJob, sink: &dyn BlockSink, rng: &mut R) -> std::result::Result<FillReport, SinkError> {
    let options = &job.options;
    let top = job.bounds.max.y;
    let needs_read = options.fill_mode_only || options.ignore_block.is_some();
    let mut report = FillReport::default();

    for cell in job.bounds.cells() {
        report.cells_visited += 1;
        let current = if needs_read { sink.current_block(cell) } else { BlockSpec::AIR };

        if let Some(ignore) = options.ignore_block {
            if current.same_type(&ignore) {
                report.cells_skipped += 1;
                continue;
            }
        }

        if cell.y == top {
            if let Some(surface) = options.surface {
                sink.set_block(cell, surface)?;
                report.cells_written += 1;
                report.surface_cells += 1;
                continue;
            }
        }

        if options.fill_mode_only && !current.is_empty() {
            report.cells_skipped += 1;
            continue;
        }

        sink.set_block(cell, job.partition.sample_with(rng))?;
        report.cells_written += 1;
    }

    Ok(report)
}

/// Fire-once completion slot shared between the fill task and the sink callback
#[derive(Clone)]
struct CompletionSignal {
    tx: Arc<Mutex<Option<oneshot::Sender<Result<FillReport>>>>>,
}

impl CompletionSignal {
    fn new() -> (Self, oneshot::Receiver<Result<FillReport>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Arc::new(Mutex::new(Some(tx))) }, rx)
    }

    fn fire(&self, result: Result<FillReport>) {
        if let Some(tx) = self.tx.lock().unwrap().take() {
            let _ = tx.send(result);
        }
    }
}

/// Completion of a running fill
pub struct FillHandle {
    mine: String,
    rx: oneshot::Receiver<Result<FillReport>>,
}

impl FillHandle {
    pub fn mine(&self) -> &str {
        &self.mine
    }

    /// Wait for the fill to finish
    pub async fn wait(self) -> Result<FillReport> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::FillAborted(self.mine)),
        }
    }

    /// Result if the fill has already finished
    pub fn try_result(&mut self) -> Option<Result<FillReport>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(Error::FillAborted(self.mine.clone()))),
        }
    }
}

/// Runs fills off the calling thread
#[derive(Clone)]
pub struct RegionFiller {
    runtime: Handle,
}

impl RegionFiller {
    /// Create a filler that runs on the given runtime
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Create a filler on the current tokio runtime.
    ///
    /// Panics if called outside a tokio runtime context.
    pub fn with_current_runtime() -> Self {
        Self::new(Handle::current())
    }

    /// Runtime the fills are spawned on
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Start a fill; the returned handle resolves once the sink has applied every write
    pub fn fill(&self, job: FillJob, sink: Arc<dyn BlockSink>) -> FillHandle {
        let (signal, rx) = CompletionSignal::new();
        let mine = job.mine.clone();

        self.runtime.spawn_blocking(move || {
            let mut rng = match job.options.seed {
                Some(seed) => Xoshiro256StarStar::seed_from_u64(seed),
                None => Xoshiro256StarStar::from_rng(&mut rand::rng()),
            };

            log::debug!("Filling mine '{}' ({} cells)", job.mine, job.bounds.volume());

            match fill_cells(&job, sink.as_ref(), &mut rng) {
                Ok(report) => {
                    let on_applied = signal.clone();
                    if let Err(source) = sink.enqueue_completion(Box::new(move || on_applied.fire(Ok(report)))) {
                        signal.fire(Err(Error::Sink { mine: job.mine, source }));
                    }
                }
                Err(source) => {
                    log::error!("Block sink rejected a write for mine '{}': {}", job.mine, source);
                    signal.fire(Err(Error::Sink { mine: job.mine, source }));
                }
            }
        });

        FillHandle { mine, rx }
    }
}
