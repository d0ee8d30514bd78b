//=========================================================================
// Placement
//=========================================================================
//
// Table coordinates, start positions and the reference mover.
//
// `Mover` is the in-crate movement controller: physics reads its
// position and moving flag, orchestration drives it through the
// `MovementController` trait.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

//=== Internal Dependencies ===============================================

use super::rig::MovementController;
use crate::core::progress::{progress, Lerp};
use crate::core::score::Player;
use crate::error::GameResult;

//=== Position ============================================================

/// A point on the table plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Lerp for Position {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        Self {
            x: f32::lerp(a.x, b.x, t),
            y: f32::lerp(a.y, b.y, t),
        }
    }
}

//=== RinkLayout ==========================================================

/// Start positions for paddles and puck.
///
/// The left paddle defends negative `x`, the right paddle positive `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RinkLayout {
    pub left_start: Position,
    pub right_start: Position,
    pub puck_center: Position,
    /// Distance from the centre towards a player's half when serving.
    pub serve_offset: f32,
}

impl RinkLayout {
    /// Puck placement favouring `receiver` (serve-to-loser rule).
    pub fn serve_position(&self, receiver: Player) -> Position {
        let dx = match receiver {
            Player::Left => -self.serve_offset,
            Player::Right => self.serve_offset,
        };
        Position::new(self.puck_center.x + dx, self.puck_center.y)
    }
}

impl Default for RinkLayout {
    fn default() -> Self {
        Self {
            left_start: Position::new(-4.0, 0.0),
            right_start: Position::new(4.0, 0.0),
            puck_center: Position::new(0.0, 0.0),
            serve_offset: 1.5,
        }
    }
}

//=== Mover ===============================================================

/// Reference movement controller with interpolated moves.
pub struct Mover {
    position: Mutex<Position>,
    moving: AtomicBool,
}

impl Mover {
    /// Creates a stopped mover at `position`.
    pub fn new(position: Position) -> Self {
        Self {
            position: Mutex::new(position),
            moving: AtomicBool::new(false),
        }
    }

    /// Current position.
    pub fn position(&self) -> Position {
        *self.position.lock()
    }

    /// Whether player input / physics may move this body.
    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::Acquire)
    }
}

#[async_trait]
impl MovementController for Mover {
    fn start_moving(&self) {
        self.moving.store(true, Ordering::Release);
    }

    fn stop_moving(&self) {
        self.moving.store(false, Ordering::Release);
    }

    fn move_to(&self, position: Position) {
        *self.position.lock() = position;
    }

    async fn move_to_async(
        &self,
        position: Position,
        duration_secs: f32,
        token: &CancellationToken,
    ) -> GameResult<()> {
        let from = self.position();
        progress(|p| self.move_to(p), from, position, duration_secs, token).await
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
