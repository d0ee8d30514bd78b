//=========================================================================
// Event Collector
//=========================================================================
//
// Application-side event collector with bounded polling and shutdown
// detection.
//
// Architecture:
//   Receiver<AppEvent> → collect_frame() → events → TickControl
//
// Bounded polling keeps one flood of input from starving the tick loop.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::AppEvent;

//=== Constants ===========================================================

const MAX_EVENTS_PER_FRAME: usize = 100;

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

/// Collects UI events with bounded polling.
pub(crate) struct EventCollector {
    receiver: Receiver<AppEvent>,
    events: Vec<AppEvent>,
}

impl EventCollector {
    pub(crate) fn new(receiver: Receiver<AppEvent>) -> Self {
        Self {
            receiver,
            events: Vec::with_capacity(4),
        }
    }

    /// Collects pending events for this tick.
    ///
    /// Returns [`TickControl::Exit`] on `Quit` or when every sender is gone.
    /// Events queued before a `Quit` in the same tick are still collected.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        self.events.clear();
        let mut drained = 0;

        while drained < MAX_EVENTS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(AppEvent::Quit) => return TickControl::Exit,
                Ok(event) => {
                    self.events.push(event);
                    drained += 1;
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= MAX_EVENTS_PER_FRAME {
            warn!("Event queue backlog: drained {} events this frame", drained);
        }

        TickControl::Continue
    }

    /// Takes the collected events, leaving an empty buffer.
    pub(crate) fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
