//! Countdown state machine, scheduler and tick driver.

pub mod countdown;
pub mod scheduler;
pub mod driver;
pub mod config;

pub use config::SchedulerConfig;
pub use countdown::{Countdown, CountdownPhase, TickOutcome};
pub use driver::CronDriver;
pub use scheduler::MineScheduler;
