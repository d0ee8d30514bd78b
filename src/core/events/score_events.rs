//=========================================================================
// Score Events
//=========================================================================
//
// Typed multicast for goal notifications.
//
// Architecture:
//   goal_scored() → emit(player, score) → handler_1, handler_2, ...
//
// Handlers are invoked synchronously, exactly once per emit, in
// subscription order. Every subscribe must be paired with exactly one
// unsubscribe; both directions are logged when the pairing breaks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use crate::core::score::{Player, Score};

//=== Types ===============================================================

/// Handler invoked with the scoring player and the new score.
pub type ScoreHandler = Arc<dyn Fn(Player, Score) + Send + Sync>;

/// Token returned by [`ScoreEvents::subscribe`], consumed by unsubscribe.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

//=== ScoreEvents =========================================================

/// Registration point for goal handlers.
pub struct ScoreEvents {
    handlers: Mutex<Vec<(u64, ScoreHandler)>>,
    next_id: AtomicU64,
}

impl ScoreEvents {
    /// Creates a source with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a handler and returns its subscription token.
    pub fn subscribe(&self, handler: ScoreHandler) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().push((id, handler));
        debug!("Score handler {} subscribed", id);
        SubscriptionId(id)
    }

    /// Removes the handler registered under `id`.
    ///
    /// Returns false if no such handler exists. The token is consumed so a
    /// subscription cannot be released twice through the same handle.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(pos) = handlers.iter().position(|(h, _)| *h == id.0) else {
            warn!("Score handler {} was not subscribed", id.0);
            return false;
        };
        handlers.remove(pos);
        debug!("Score handler {} unsubscribed", id.0);
        true
    }

    //--- Delivery ---------------------------------------------------------

    /// Delivers a goal to every registered handler.
    ///
    /// The handler list is snapshotted first so handlers may unsubscribe
    /// themselves (or others) while being invoked.
    pub fn emit(&self, player: Player, score: Score) {
        let snapshot: Vec<ScoreHandler> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(player, score);
        }
    }

    //--- Query API --------------------------------------------------------

    /// Number of live subscriptions.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl Default for ScoreEvents {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
