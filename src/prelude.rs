//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use rink_referee::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Application facade
pub use crate::app::{App, AppBuilder, AppState, ScreenFader};
pub use crate::config::MatchTimings;
pub use crate::error::{GameError, GameResult};

// Match model
pub use crate::core::score::{FinalResult, MatchMode, MatchSettings, Player, Score};

// Match flow and collaborators
pub use crate::core::match_flow::{
    Announcer, AudioCue, AudioCues, MatchOrchestrator, MatchPhase, MatchRig, MovementController,
    Position, RinkLayout, TimerDisplay,
};

// Scenes and UI events
pub use crate::core::platform_bridge::AppEvent;
pub use crate::core::scene::{MenuController, MenuRig, SceneKey, SceneLoader};
