//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// UI-to-application events.
//
// Menu buttons, the end-of-match screen and the OS back button all post
// into one bounded channel consumed by the application tick loop.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::score::MatchSettings;

//=== AppEvent ============================================================

/// Events sent from the UI to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Back/return navigation.
    Back,

    /// Menu asked for a new match.
    StartMatch(MatchSettings),

    /// End-of-match "play again".
    RestartMatch,

    /// End-of-match "back to menu".
    LeaveMatch,

    /// Quit confirmed.
    Quit,
}
