//=========================================================================
// Rink Referee: Library Root
//
// Match orchestration for a two-player air-hockey game.
//
// Responsibilities:
// - Expose the application facade (`App`, `AppBuilder`)
// - Expose the match core (score model, referee policies, orchestrator)
//   for hosts that drive matches without the application layer
// - Keep rendering, audio, physics and input behind collaborator traits
//   implemented by the host
//
// Typical usage:
// ```no_run
// use std::sync::Arc;
// use rink_referee::prelude::*;
//
// async fn host(loader: Arc<dyn SceneLoader>, fader: Arc<dyn ScreenFader>) {
//     let app = AppBuilder::new().build(loader, fader);
//     app.run().await.unwrap();
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the match machinery. It is public so hosts can run a
// `MatchOrchestrator` directly, but most code only needs `App`.
//
pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `testing` provides journaling fakes of every collaborator.
//
#[cfg(test)]
mod testing;

//--- Public Exports ------------------------------------------------------

pub use app::{App, AppBuilder, AppState, ScreenFader};
pub use config::MatchTimings;
pub use error::{GameError, GameResult};
