//=========================================================================
// Platform Bridge
//=========================================================================
//
// Bridges the host UI layer with the application orchestrator.
//
// The host owns a `Sender<AppEvent>` obtained from `App::event_sender`;
// the application drains the matching receiver once per tick. Neither
// side calls into the other directly.
//
// Components:
// - `interface`: the event contract
// - `event_collector`: application-side draining and exit detection
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub(crate) mod interface;

//=== Public API ==========================================================

pub use interface::AppEvent;

//=== Internal API ========================================================

pub(crate) use event_collector::{EventCollector, TickControl};
