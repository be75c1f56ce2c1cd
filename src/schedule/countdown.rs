//! Per-mine countdown state machine.
//!
//! One call to [`Countdown::tick`] per scheduling interval (a minute in the
//! host). The countdown only reports what happened; the scheduler turns the
//! outcome into broadcasts and resets.

/// Observable phase of a countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownPhase {
    /// Reset interval is 0, ticks do nothing
    Disabled,
    /// Minutes remaining until the next automatic reset
    Counting(u32),
}

/// Result of a single tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to announce
    Idle,
    /// The clock reached one or more warning thresholds.
    /// Duplicated thresholds appear once per occurrence.
    Warning(Vec<u32>),
    /// The clock reached zero; a reset is due and the clock has been rearmed
    Reset,
}

/// Reset interval, warning thresholds and the live clock
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    reset_delay: u32,
    warnings: Vec<u32>,
    clock: u32,
}

impl Countdown {
    /// Countdown armed at its full interval
    pub fn new(reset_delay: u32, warnings: Vec<u32>) -> Self {
        Self { reset_delay, warnings, clock: reset_delay }
    }

    /// Countdown restored with an explicit clock value.
    ///
    /// A stored clock of 0 with a non-zero interval predates the clock field
    /// and is rearmed to the full interval.
    pub fn restore(reset_delay: u32, warnings: Vec<u32>, clock: u32) -> Self {
        let clock = if reset_delay > 0 && clock == 0 { reset_delay } else { clock };
        Self { reset_delay, warnings, clock }
    }

    pub fn phase(&self) -> CountdownPhase {
        if self.reset_delay == 0 {
            CountdownPhase::Disabled
        } else {
            CountdownPhase::Counting(self.clock)
        }
    }

    pub fn reset_delay(&self) -> u32 {
        self.reset_delay
    }

    /// Change the interval and rearm the clock to it
    pub fn set_reset_delay(&mut self, minutes: u32) {
        self.reset_delay = minutes;
        self.clock = minutes;
    }

    pub fn warnings(&self) -> &[u32] {
        &self.warnings
    }

    pub fn set_warnings(&mut self, warnings: Vec<u32>) {
        self.warnings = warnings;
    }

    /// Ticks left until the next automatic reset
    pub fn clock(&self) -> u32 {
        self.clock
    }

    /// Advance by one interval.
    ///
    /// Reaching zero reports `Reset` and rearms without checking warnings that tick.
    pub fn tick(&mut self) -> TickOutcome {
        if self.reset_delay == 0 {
            return TickOutcome::Idle;
        }
        self.clock = self.clock.saturating_sub(1);

        if self.clock == 0 {
            self.clock = self.reset_delay;
            return TickOutcome::Reset;
        }

        let hits: Vec<u32> = self.warnings.iter().copied().filter(|w| *w == self.clock).collect();
        if hits.is_empty() {
            TickOutcome::Idle
        } else {
            TickOutcome::Warning(hits)
        }
    }
}
