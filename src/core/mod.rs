//=========================================================================
// Core Systems
//=========================================================================
//
// Subsystems sequenced by the application orchestrator.
//
// Layering (each layer only depends on the ones above it):
// ```text
//   progress, score          timed interpolation, immutable score model
//   events                   score-event multicast
//   referee                  when to pause and when to end (per mode)
//   match_flow               one match: phases, goal sequence, collaborators
//   scene                    managed Menu/Match scene swapping
//   platform_bridge          UI events → application
// ```
//
//=========================================================================

//=== Module Declarations =================================================

pub mod events;
pub mod match_flow;
pub mod platform_bridge;
pub mod progress;
pub mod referee;
pub mod scene;
pub mod score;

//=== Public API ==========================================================

pub use events::{ScoreEvents, ScoreHandler, SubscriptionId};
pub use match_flow::{MatchOrchestrator, MatchPhase, MatchRig};
pub use platform_bridge::AppEvent;
pub use progress::{progress, Lerp};
pub use referee::{Referee, RefereeHooks, RefereePolicy};
pub use scene::{SceneKey, SceneLoader, SceneManager};
pub use score::{FinalResult, MatchMode, MatchSettings, Player, Score};
