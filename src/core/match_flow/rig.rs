//=========================================================================
// Match Rig
//=========================================================================
//
// Collaborator contracts the match orchestrator depends on, and the
// `MatchRig` bundle exposed as the Match scene's root controller.
//
// Rendering, audio playback, UI animation and physics live behind these
// traits; the orchestrator only sequences them.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

//=== Internal Dependencies ===============================================

use super::placement::Position;
use crate::core::score::{FinalResult, Player};
use crate::error::GameResult;

//=== MovementController ==================================================

/// Enable/disable and reposition a paddle or the puck.
#[async_trait]
pub trait MovementController: Send + Sync {
    /// Hands control back to input/physics.
    fn start_moving(&self);

    /// Freezes the body in place.
    fn stop_moving(&self);

    /// Teleports the body.
    fn move_to(&self, position: Position);

    /// Interpolates the body to `position` over `duration_secs`.
    ///
    /// Fails with `InvalidArgument` on a negative duration and with
    /// `Cancelled` when `token` fires.
    async fn move_to_async(
        &self,
        position: Position,
        duration_secs: f32,
        token: &CancellationToken,
    ) -> GameResult<()>;
}

//=== Announcer ===========================================================

/// On-screen announcement overlay.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Countdown before the first serve.
    async fn announce_match_start(&self, seconds: Duration, token: &CancellationToken)
        -> GameResult<()>;

    /// Goal celebration for `player`.
    async fn announce_goal(
        &self,
        player: Player,
        duration: Duration,
        token: &CancellationToken,
    ) -> GameResult<()>;

    /// "Get ready" prompt before play (re)starts.
    async fn announce_get_ready(&self, duration: Duration, token: &CancellationToken)
        -> GameResult<()>;

    /// Final result banner. Fire-and-forget.
    fn announce_end_of_match(&self, result: FinalResult);

    /// Fades the overlay away.
    async fn fade_out(&self, token: &CancellationToken) -> GameResult<()>;
}

//=== AudioCues ===========================================================

/// Cues the orchestrator can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// First serve of the match.
    MatchStart,
    /// Play resumes after a goal.
    Resume,
    /// Match over, by referee decision.
    MatchEnd,
    /// Match abandoned by the user.
    MatchStopped,
}

/// Audio trigger surface.
#[async_trait]
pub trait AudioCues: Send + Sync {
    /// Plays a cue without waiting for it.
    fn play(&self, cue: AudioCue);

    /// Fades every playing source to silence over `duration`.
    async fn fade_out_all(&self, duration: Duration);
}

//=== TimerDisplay ========================================================

/// Visible countdown for time mode.
pub trait TimerDisplay: Send + Sync {
    /// Shows the timer at its starting value.
    fn show(&self, initial_minutes: u32);

    /// Updates the remaining time.
    fn set_time(&self, remaining_seconds: u32);
}

//=== MatchRig ============================================================

/// Collaborators wired into the Match scene.
///
/// Returned as the Match scene's root controller by the scene loader.
#[derive(Clone)]
pub struct MatchRig {
    pub left: Arc<dyn MovementController>,
    pub right: Arc<dyn MovementController>,
    pub puck: Arc<dyn MovementController>,
    pub announcer: Arc<dyn Announcer>,
    pub audio: Arc<dyn AudioCues>,
    pub timer: Arc<dyn TimerDisplay>,
}

impl MatchRig {
    /// Freezes paddles and puck.
    pub fn stop_all(&self) {
        self.left.stop_moving();
        self.right.stop_moving();
        self.puck.stop_moving();
    }
}
