//=========================================================================
// Scene Manager
//=========================================================================
//
// Swaps the single managed scene and hands back its typed controller.
//
// Invariant: the previous scene's unload completes before the next load
// begins. The very first load has nothing to unload.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{type_name, Any};
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use super::{SceneKey, SceneLoader};
use crate::error::{GameError, GameResult};

//=== Scene Manager =======================================================

/// Owner of the currently loaded scene.
pub struct SceneManager {
    loader: Arc<dyn SceneLoader>,
    current: Mutex<Option<SceneKey>>,
}

impl SceneManager {
    //--- Construction -----------------------------------------------------

    /// Creates a manager with no scene loaded.
    pub fn new(loader: Arc<dyn SceneLoader>) -> Self {
        Self {
            loader,
            current: Mutex::new(None),
        }
    }

    //--- Loading ----------------------------------------------------------

    /// Replaces the current scene with `scene` and returns its controller.
    ///
    /// # Errors
    ///
    /// - [`GameError::SceneNotLoaded`] if the loader finished but the scene
    ///   reports as not loaded
    /// - [`GameError::ControllerMissing`] if the scene has no root
    ///   controller of type `T`
    /// - any error raised by the loader itself
    pub async fn load_managed_scene<T>(&self, scene: SceneKey) -> GameResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.unload_current().await?;

        debug!("Loading scene {:?}", scene);
        self.loader.load_scene(scene).await?;

        if !self.loader.is_loaded(scene) {
            return Err(GameError::SceneNotLoaded(scene));
        }
        *self.current.lock() = Some(scene);

        let missing = || GameError::ControllerMissing {
            scene,
            expected: type_name::<T>(),
        };
        let controller = self
            .loader
            .root_controller(scene)
            .ok_or_else(missing)?
            .downcast::<T>()
            .map_err(|_| missing())?;

        info!("Scene {:?} loaded", scene);
        Ok(controller)
    }

    /// Unloads the current scene, if any.
    pub async fn unload_current(&self) -> GameResult<()> {
        let previous = self.current.lock().take();
        if let Some(previous) = previous {
            debug!("Unloading scene {:?}", previous);
            self.loader.unload_scene(previous).await?;
        }
        Ok(())
    }

    //--- Query API --------------------------------------------------------

    /// The scene currently loaded through this manager.
    pub fn current(&self) -> Option<SceneKey> {
        *self.current.lock()
    }
}

//=== Tests ===============================================================
