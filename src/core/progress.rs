//=========================================================================
// Progress Driver
//=========================================================================
//
// Time-based linear interpolation used by fades and smooth movement.
//
// Flow:
//   progress() ──tick──> update(lerp(start, end, t)) ──...──> update(end)
//
// One tick is one scheduler frame (FRAME_INTERVAL on the tokio clock).
// The number of intermediate updates depends on frame timing; the final
// update always carries exactly `end`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

//=== Internal Dependencies ===============================================

use crate::error::{GameError, GameResult};

//=== Constants ===========================================================

/// Length of one scheduler frame.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

//=== Lerp Trait ==========================================================

/// Values that can be linearly interpolated.
pub trait Lerp: Copy {
    /// Returns the value at fraction `t` (0.0..=1.0) between `a` and `b`.
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

//=== progress() ==========================================================

/// Drives `update` from `start` towards `end` over `duration_secs`.
///
/// Each frame `update` receives the interpolated value for the elapsed
/// fraction. Once elapsed time reaches the duration, `update(end)` is
/// invoked exactly once.
///
/// # Errors
///
/// - [`GameError::InvalidArgument`] if the duration is negative or not
///   finite; `update` is never called.
/// - [`GameError::Cancelled`] if `token` fires before completion; the
///   final `update(end)` is skipped.
pub async fn progress<T, F>(
    mut update: F,
    start: T,
    end: T,
    duration_secs: f32,
    token: &CancellationToken,
) -> GameResult<()>
where
    T: Lerp,
    F: FnMut(T),
{
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(GameError::InvalidArgument(duration_secs));
    }

    // Too long to represent means it never completes.
    let duration = Duration::try_from_secs_f32(duration_secs).unwrap_or(Duration::MAX);
    let started = Instant::now();

    loop {
        let elapsed = started.elapsed();
        if elapsed >= duration {
            break;
        }

        update(T::lerp(start, end, elapsed.as_secs_f32() / duration_secs));

        tokio::select! {
            _ = token.cancelled() => return Err(GameError::Cancelled),
            _ = sleep(FRAME_INTERVAL) => {}
        }
    }

    if token.is_cancelled() {
        return Err(GameError::Cancelled);
    }

    update(end);
    Ok(())
}

//=========================================================================
// Unit Tests
//=========================================================================
