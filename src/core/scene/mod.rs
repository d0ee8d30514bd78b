//=========================================================================
// Scene System
//=========================================================================
//
// Managed loading of the Menu and Match scenes.
//
// Architecture:
//   SceneManager
//     ├─ loader: Arc<dyn SceneLoader>   (engine-side asset loading)
//     └─ current: Option<SceneKey>      (at most one managed scene)
//
// Flow:
//   load_managed_scene::<T>(key)
//     → unload(current) → load(key) → root_controller(key) → Arc<T>
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

//=== Internal Dependencies ===============================================

use crate::error::GameResult;

//=== Module Declarations =================================================

mod menu;
mod scene_manager;

//=== Public API ==========================================================

pub use menu::{MenuController, MenuRig};
pub use scene_manager::SceneManager;

//=== SceneKey ============================================================

/// Scenes the application moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Menu,
    Match,
}

/// Type-erased root controller of a loaded scene.
pub type SceneController = Arc<dyn Any + Send + Sync>;

//=== SceneLoader Trait ===================================================

/// Engine-side scene loading.
///
/// Scenes load additively; the manager guarantees a previous scene is
/// fully unloaded before the next load starts.
#[async_trait]
pub trait SceneLoader: Send + Sync {
    /// Loads `scene` and completes once it is ready.
    async fn load_scene(&self, scene: SceneKey) -> GameResult<()>;

    /// Unloads `scene` and completes once it is gone.
    async fn unload_scene(&self, scene: SceneKey) -> GameResult<()>;

    /// Whether `scene` reports as loaded.
    fn is_loaded(&self, scene: SceneKey) -> bool;

    /// Root controller of a loaded scene.
    fn root_controller(&self, scene: SceneKey) -> Option<SceneController>;
}
