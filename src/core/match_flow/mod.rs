//=========================================================================
// Match Flow
//=========================================================================
//
// Everything that happens inside the Match scene.
//
// Components:
// - `rig`: collaborator contracts (movement, announcer, audio, timer)
// - `placement`: table coordinates, start positions, reference mover
// - `orchestrator`: match lifecycle, goal sequence, termination
//
//=========================================================================

//=== Module Declarations =================================================

mod orchestrator;
mod placement;
mod rig;

//=== Public API ==========================================================

pub use orchestrator::{MatchOrchestrator, MatchPhase};
pub use placement::{Mover, Position, RinkLayout};
pub use rig::{AudioCue, AudioCues, Announcer, MatchRig, MovementController, TimerDisplay};
