//=========================================================================
// Menu Scene
//=========================================================================
//
// Contract of the menu UI and the Menu scene's root controller.
//
// Start-match requests travel back to the application as
// `AppEvent::StartMatch` over the platform bridge.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

//=== MenuController ======================================================

/// Navigation the application delegates to the menu.
pub trait MenuController: Send + Sync {
    /// True when the menu shows its top-level screen.
    fn is_at_top_level(&self) -> bool;

    /// Asks the user to confirm quitting.
    fn show_quit_popup(&self);

    /// Navigates from a submenu back to the top-level screen.
    fn return_to_top(&self);
}

//=== MenuRig =============================================================

/// Root controller of the Menu scene.
#[derive(Clone)]
pub struct MenuRig {
    pub menu: Arc<dyn MenuController>,
}

impl MenuRig {
    pub fn new(menu: Arc<dyn MenuController>) -> Self {
        Self { menu }
    }
}
