//=========================================================================
// Game Errors
//=========================================================================
//
// Error taxonomy shared by every orchestration layer.
//
// Categories:
// - Invalid argument: rejected immediately, never retried
// - Cancellation: expected unwinding of an in-flight sequence; swallowed
//   at the boundary that started it
// - Invariant violation: unknown mode, missing scene or controller;
//   fatal for the application
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::scene::SceneKey;

//=== GameError ===========================================================

/// Errors raised by the orchestration core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// A timed operation received a negative or non-finite duration.
    #[error("invalid duration: {0} seconds")]
    InvalidArgument(f32),

    /// The sequence was unwound by its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A menu selection index does not map to any match mode.
    #[error("unknown match mode index {0}")]
    UnknownMode(u8),

    /// The scene loader finished but the scene reports as not loaded.
    #[error("scene {0:?} failed to load")]
    SceneNotLoaded(SceneKey),

    /// The loaded scene exposes no root controller of the requested type.
    #[error("scene {scene:?} has no {expected} controller")]
    ControllerMissing {
        scene: SceneKey,
        expected: &'static str,
    },
}

impl GameError {
    /// True for the benign termination path (cancellation).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Convenience alias used across the crate.
pub type GameResult<T> = Result<T, GameError>;

//=========================================================================
// Unit Tests
//=========================================================================
