//=========================================================================
// Match Clock
//=========================================================================
//
// Countdown driving the time-mode referee.
//
// States:
//   Running ──goal──> Paused ──reset done──> Running
//      │                 │
//      └──── expired / left ────> Stopped (terminal)
//
// The loop ticks at a fixed cadence independent of scoring. Elapsed time
// accrues one tick at a time and only while Running, so a pause of any
// length loses nothing and adds nothing.
//
// Pauses nest: every `pause` holds the clock until its matching `resume`,
// and the clock runs again only once no hold is outstanding.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

//=== Constants ===========================================================

/// Clock cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Ticks per modeled second; one display update is sent per second.
pub const TICKS_PER_UPDATE: u64 = 10;

//=== Types ===============================================================

/// Callback receiving the remaining whole seconds once per modeled second.
pub type ClockUpdate = Box<dyn Fn(u32) + Send + Sync>;

/// Clock lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Paused,
    Stopped,
}

/// Why the tick loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockExit {
    /// Elapsed time reached the limit.
    Expired,
    /// Stopped externally before expiry.
    Stopped,
}

struct ClockInner {
    state: ClockState,
    holds: u32,
    elapsed: Duration,
    ticks: u64,
}

//=== MatchClock ==========================================================

/// Pausable countdown with a fixed tick cadence.
pub struct MatchClock {
    limit: Duration,
    inner: Mutex<ClockInner>,
    on_update: ClockUpdate,
}

impl MatchClock {
    /// Creates a running clock for `limit`. Ticks begin with [`MatchClock::run`].
    pub fn new(limit: Duration, on_update: ClockUpdate) -> Self {
        Self {
            limit,
            inner: Mutex::new(ClockInner {
                state: ClockState::Running,
                holds: 0,
                elapsed: Duration::ZERO,
                ticks: 0,
            }),
            on_update,
        }
    }

    //--- State Control ----------------------------------------------------

    /// Adds a hold and stops accruing time. No-op once Stopped.
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Stopped {
            return;
        }
        inner.holds += 1;
        if inner.state == ClockState::Running {
            inner.state = ClockState::Paused;
            debug!("Match clock paused at {:?}", inner.elapsed);
        }
    }

    /// Releases one hold; time accrues again when none remain.
    pub fn resume(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Stopped {
            return;
        }
        inner.holds = inner.holds.saturating_sub(1);
        if inner.holds == 0 && inner.state == ClockState::Paused {
            inner.state = ClockState::Running;
            debug!("Match clock resumed at {:?}", inner.elapsed);
        }
    }

    /// Moves to the terminal state. Returns true on the first call only.
    pub fn stop(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == ClockState::Stopped {
            return false;
        }
        inner.state = ClockState::Stopped;
        true
    }

    //--- Query API --------------------------------------------------------

    pub fn state(&self) -> ClockState {
        self.inner.lock().state
    }

    /// Time left on the clock.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.inner.lock().elapsed)
    }

    //--- Tick Loop --------------------------------------------------------

    /// Runs the countdown until it expires, is stopped, or `token` fires.
    ///
    /// Sends `remaining_seconds` every [`TICKS_PER_UPDATE`] running ticks.
    /// On expiry the clock is Stopped before returning
    /// [`ClockExit::Expired`]; the caller ends the match.
    pub async fn run(&self, token: &CancellationToken) -> ClockExit {
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Match clock started ({:?})", self.limit);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    self.stop();
                    debug!("Match clock cancelled");
                    return ClockExit::Stopped;
                }
                _ = ticker.tick() => {}
            }

            let (update, expired) = {
                let mut inner = self.inner.lock();
                match inner.state {
                    ClockState::Stopped => return ClockExit::Stopped,
                    ClockState::Paused => continue,
                    ClockState::Running => {}
                }

                inner.elapsed += TICK_INTERVAL;
                inner.ticks += 1;

                let update = (inner.ticks % TICKS_PER_UPDATE == 0)
                    .then(|| self.limit.saturating_sub(inner.elapsed).as_secs() as u32);
                let expired = inner.elapsed >= self.limit;
                if expired {
                    inner.state = ClockState::Stopped;
                }
                (update, expired)
            };

            if let Some(remaining) = update {
                (self.on_update)(remaining);
            }

            if expired {
                info!("Match clock expired");
                return ClockExit::Expired;
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
