//=========================================================================
// Score Model
//=========================================================================
//
// Immutable per-goal score state and match settings.
//
// Each goal produces a new `Score` from the previous one; scores are
// never mutated in place. `MatchSettings` is created by the menu and
// consumed once per match to pick the referee policy.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

//=== Internal Dependencies ===============================================

use crate::error::{GameError, GameResult};

//=== Player ==============================================================

/// One side of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Left,
    Right,
}

impl Player {
    /// The other side of the table.
    pub fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

//=== FinalResult =========================================================

/// Outcome of a match as seen by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalResult {
    Tie,
    LeftPlayerWin,
    RightPlayerWin,
}

//=== Score ===============================================================

/// Goal counts for both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    /// Creates a score from explicit counts.
    pub fn new(left: u32, right: u32) -> Self {
        Self { left, right }
    }

    /// Returns a new score with one more goal for `scorer`.
    #[must_use]
    pub fn apply_goal(self, scorer: Player) -> Self {
        match scorer {
            Player::Left => Self {
                left: self.left + 1,
                ..self
            },
            Player::Right => Self {
                right: self.right + 1,
                ..self
            },
        }
    }

    /// Goals scored by `player`.
    pub fn goals(&self, player: Player) -> u32 {
        match player {
            Player::Left => self.left,
            Player::Right => self.right,
        }
    }

    /// Tie on equal counts, otherwise the player ahead.
    pub fn final_result(&self) -> FinalResult {
        use std::cmp::Ordering::*;
        match self.left.cmp(&self.right) {
            Equal => FinalResult::Tie,
            Greater => FinalResult::LeftPlayerWin,
            Less => FinalResult::RightPlayerWin,
        }
    }
}

//=== MatchMode ===========================================================

/// Win-condition policy chosen in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// First to `value` goals.
    HighScore,
    /// Best of `value` goals (majority wins).
    BestOfScore,
    /// `value` minutes on the clock.
    Time,
    /// No end condition.
    Endless,
}

impl MatchMode {
    /// Maps a menu selection index to a mode.
    ///
    /// Indices follow the menu's option order: high score, best of,
    /// time, endless.
    pub fn from_index(index: u8) -> GameResult<Self> {
        match index {
            0 => Ok(Self::HighScore),
            1 => Ok(Self::BestOfScore),
            2 => Ok(Self::Time),
            3 => Ok(Self::Endless),
            other => Err(GameError::UnknownMode(other)),
        }
    }
}

//=== MatchSettings =======================================================

/// Mode plus its mode-dependent value.
///
/// `value` is the score threshold, the best-of count, or the duration in
/// minutes. It is ignored for [`MatchMode::Endless`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchSettings {
    pub mode: MatchMode,
    pub value: u32,
}

impl MatchSettings {
    pub fn new(mode: MatchMode, value: u32) -> Self {
        Self { mode, value }
    }

    /// Goals needed to win a best-of-`value` match: `ceil(value / 2)`.
    pub fn best_of_majority(&self) -> u32 {
        self.value.div_ceil(2)
    }

    /// Clock length for time mode.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.value) * 60)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
