//=========================================================================
// Event Sources
//=========================================================================
//
// Observer registration points shared between subsystems.
//
// Components:
// - `score_events`: multicast of (scorer, score) after every goal
//
//=========================================================================

//=== Module Declarations =================================================

mod score_events;

//=== Public API ==========================================================

pub use score_events::{ScoreEvents, ScoreHandler, SubscriptionId};
