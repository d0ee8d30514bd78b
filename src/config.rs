//=========================================================================
// Match Timings
//=========================================================================
//
// Durations of the choreographed match phases.
//
// Configured fluently in the same manner as `AppBuilder`:
// ```text
//   MatchTimings::default()
//       .with_match_start(..)     countdown before the first serve
//       .with_preparation(..)     "get ready" before every serve
//       .with_celebration(..)     goal announcement
//       .with_reset(..)           paddles gliding back to start
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== MatchTimings ========================================================

/// Durations used by the match orchestrator.
///
/// # Default Values
///
/// - **Match start countdown**: 3 s
/// - **Preparation**: 1 s
/// - **Goal celebration**: 2 s
/// - **Reset move**: 1 s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTimings {
    pub match_start: Duration,
    pub preparation: Duration,
    pub celebration: Duration,
    pub reset: Duration,
}

impl MatchTimings {
    /// Sets the countdown shown before the first serve.
    pub fn with_match_start(mut self, duration: Duration) -> Self {
        self.match_start = duration;
        self
    }

    /// Sets the "get ready" duration preceding every serve.
    pub fn with_preparation(mut self, duration: Duration) -> Self {
        self.preparation = duration;
        self
    }

    /// Sets how long a goal is celebrated.
    pub fn with_celebration(mut self, duration: Duration) -> Self {
        self.celebration = duration;
        self
    }

    /// Sets how long paddles take to glide back to their start positions.
    pub fn with_reset(mut self, duration: Duration) -> Self {
        self.reset = duration;
        self
    }
}

impl Default for MatchTimings {
    fn default() -> Self {
        Self {
            match_start: Duration::from_secs(3),
            preparation: Duration::from_secs(1),
            celebration: Duration::from_secs(2),
            reset: Duration::from_secs(1),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
