//=========================================================================
// Test Fakes
//=========================================================================
//
// Recording stand-ins for every collaborator, sharing one call journal so
// tests can assert strict step ordering across components.
//
// Journal entries read `<component>:<call>[:<detail>]`, logged when the
// call begins.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

//=== Internal Dependencies ===============================================

use crate::app::ScreenFader;
use crate::core::match_flow::{
    Announcer, AudioCue, AudioCues, MatchRig, MovementController, Mover, Position, RinkLayout,
    TimerDisplay,
};
use crate::core::scene::{MenuController, SceneController, SceneKey, SceneLoader};
use crate::core::score::{FinalResult, Player};
use crate::error::{GameError, GameResult};

//=== Journal =============================================================

/// Ordered record of collaborator calls.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.lock().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Index of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }
}

/// Entries recorded after the first `mark` entries.
pub fn entries_after(journal: &Journal, mark: usize) -> Vec<String> {
    journal.entries().split_off(mark)
}

/// Sleeps for `duration` unless `token` fires first.
async fn wait(duration: Duration, token: &CancellationToken) -> GameResult<()> {
    tokio::select! {
        _ = token.cancelled() => Err(GameError::Cancelled),
        _ = sleep(duration) => Ok(()),
    }
}

//=== Movement ============================================================

/// Real [`Mover`] that journals every call under `name`.
pub struct JournaledMover {
    name: &'static str,
    inner: Mover,
    journal: Journal,
}

impl JournaledMover {
    pub fn new(name: &'static str, position: Position, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            inner: Mover::new(position),
            journal: journal.clone(),
        })
    }

    pub fn position(&self) -> Position {
        self.inner.position()
    }

    pub fn is_moving(&self) -> bool {
        self.inner.is_moving()
    }
}

#[async_trait]
impl MovementController for JournaledMover {
    fn start_moving(&self) {
        self.journal.record(format!("{}:start", self.name));
        self.inner.start_moving();
    }

    fn stop_moving(&self) {
        self.journal.record(format!("{}:stop", self.name));
        self.inner.stop_moving();
    }

    fn move_to(&self, position: Position) {
        self.journal.record(format!("{}:place", self.name));
        self.inner.move_to(position);
    }

    async fn move_to_async(
        &self,
        position: Position,
        duration_secs: f32,
        token: &CancellationToken,
    ) -> GameResult<()> {
        self.journal.record(format!("{}:glide", self.name));
        self.inner.move_to_async(position, duration_secs, token).await
    }
}

//=== Announcer ===========================================================

/// Announcer whose overlay fade takes [`FakeAnnouncer::FADE`].
pub struct FakeAnnouncer {
    journal: Journal,
    ignores_token: AtomicBool,
}

impl FakeAnnouncer {
    pub const FADE: Duration = Duration::from_millis(100);

    /// Sleeps for `duration`, observing `token` unless told to ignore it.
    async fn hold(&self, duration: Duration, token: &CancellationToken) -> GameResult<()> {
        if self.ignores_token.load(Ordering::Acquire) {
            sleep(duration).await;
            return Ok(());
        }
        wait(duration, token).await
    }
}

#[async_trait]
impl Announcer for FakeAnnouncer {
    async fn announce_match_start(
        &self,
        seconds: Duration,
        token: &CancellationToken,
    ) -> GameResult<()> {
        self.journal.record("announce:start");
        self.hold(seconds, token).await
    }

    async fn announce_goal(
        &self,
        player: Player,
        duration: Duration,
        token: &CancellationToken,
    ) -> GameResult<()> {
        self.journal.record(format!("announce:goal:{player:?}"));
        self.hold(duration, token).await
    }

    async fn announce_get_ready(
        &self,
        duration: Duration,
        token: &CancellationToken,
    ) -> GameResult<()> {
        self.journal.record("announce:ready");
        self.hold(duration, token).await
    }

    fn announce_end_of_match(&self, result: FinalResult) {
        self.journal.record(format!("announce:end:{result:?}"));
    }

    async fn fade_out(&self, token: &CancellationToken) -> GameResult<()> {
        self.journal.record("announce:fade");
        self.hold(Self::FADE, token).await
    }
}

//=== Audio ===============================================================

pub struct FakeAudio {
    journal: Journal,
}

#[async_trait]
impl AudioCues for FakeAudio {
    fn play(&self, cue: AudioCue) {
        self.journal.record(format!("audio:{cue:?}"));
    }

    async fn fade_out_all(&self, duration: Duration) {
        self.journal.record("audio:fade");
        sleep(duration).await;
    }
}

//=== Timer ===============================================================

pub struct FakeTimer {
    journal: Journal,
    updates: Arc<Mutex<Vec<u32>>>,
}

impl TimerDisplay for FakeTimer {
    fn show(&self, initial_minutes: u32) {
        self.journal.record(format!("timer:show:{initial_minutes}"));
    }

    fn set_time(&self, remaining_seconds: u32) {
        self.updates.lock().push(remaining_seconds);
    }
}

//=== RigFixture ==========================================================

/// A complete match rig backed by journaling fakes.
pub struct RigFixture {
    pub journal: Journal,
    pub left: Arc<JournaledMover>,
    pub right: Arc<JournaledMover>,
    pub puck: Arc<JournaledMover>,
    pub timer_updates: Arc<Mutex<Vec<u32>>>,
    announcer: Arc<FakeAnnouncer>,
    rig: MatchRig,
}

impl RigFixture {
    pub fn new() -> Self {
        Self::with_journal(&Journal::new())
    }

    pub fn with_journal(journal: &Journal) -> Self {
        let layout = RinkLayout::default();
        let left = JournaledMover::new("left", Position::new(-1.0, 2.0), journal);
        let right = JournaledMover::new("right", Position::new(1.0, -2.0), journal);
        let puck = JournaledMover::new("puck", layout.puck_center, journal);
        let timer_updates = Arc::new(Mutex::new(Vec::new()));
        let announcer = Arc::new(FakeAnnouncer {
            journal: journal.clone(),
            ignores_token: AtomicBool::new(false),
        });

        let rig = MatchRig {
            left: Arc::clone(&left) as Arc<dyn MovementController>,
            right: Arc::clone(&right) as Arc<dyn MovementController>,
            puck: Arc::clone(&puck) as Arc<dyn MovementController>,
            announcer: Arc::clone(&announcer) as Arc<dyn Announcer>,
            audio: Arc::new(FakeAudio {
                journal: journal.clone(),
            }),
            timer: Arc::new(FakeTimer {
                journal: journal.clone(),
                updates: Arc::clone(&timer_updates),
            }),
        };

        Self {
            journal: journal.clone(),
            left,
            right,
            puck,
            timer_updates,
            announcer,
            rig,
        }
    }

    pub fn rig(&self) -> MatchRig {
        self.rig.clone()
    }

    /// Makes every announcement run to completion even after cancellation.
    pub fn announcer_ignores_token(&self) {
        self.announcer.ignores_token.store(true, Ordering::Release);
    }
}

//=== Menu ================================================================

pub struct FakeMenu {
    journal: Journal,
    top_level: AtomicBool,
}

impl FakeMenu {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            top_level: AtomicBool::new(true),
        })
    }

    /// Simulates the user opening a submenu.
    pub fn open_submenu(&self) {
        self.top_level.store(false, Ordering::Release);
    }
}

impl MenuController for FakeMenu {
    fn is_at_top_level(&self) -> bool {
        self.top_level.load(Ordering::Acquire)
    }

    fn show_quit_popup(&self) {
        self.journal.record("menu:popup");
    }

    fn return_to_top(&self) {
        self.journal.record("menu:top");
        self.top_level.store(true, Ordering::Release);
    }
}

//=== Fader ===============================================================

/// Screen fader taking [`FakeFader::DURATION`] per fade.
pub struct FakeFader {
    journal: Journal,
}

impl FakeFader {
    pub const DURATION: Duration = Duration::from_millis(50);

    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
        })
    }
}

#[async_trait]
impl ScreenFader for FakeFader {
    async fn fade_in(&self, token: &CancellationToken) -> GameResult<()> {
        self.journal.record("fade:in");
        wait(Self::DURATION, token).await
    }

    async fn fade_out(&self, token: &CancellationToken) -> GameResult<()> {
        self.journal.record("fade:out");
        wait(Self::DURATION, token).await
    }
}

//=== Scene Loader ========================================================

/// Scene loader taking [`FakeSceneLoader::DURATION`] per load or unload.
pub struct FakeSceneLoader {
    journal: Journal,
    controllers: Mutex<HashMap<SceneKey, SceneController>>,
    loaded: Mutex<HashSet<SceneKey>>,
    refused: Mutex<HashSet<SceneKey>>,
}

impl FakeSceneLoader {
    pub const DURATION: Duration = Duration::from_millis(50);

    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            controllers: Mutex::new(HashMap::new()),
            loaded: Mutex::new(HashSet::new()),
            refused: Mutex::new(HashSet::new()),
        })
    }

    /// Registers the root controller `scene` exposes once loaded.
    pub fn provide<T>(&self, scene: SceneKey, controller: T)
    where
        T: std::any::Any + Send + Sync,
    {
        self.controllers.lock().insert(scene, Arc::new(controller));
    }

    /// Makes `scene` report as not loaded after every load.
    pub fn refuse(&self, scene: SceneKey) {
        self.refused.lock().insert(scene);
    }
}

#[async_trait]
impl SceneLoader for FakeSceneLoader {
    async fn load_scene(&self, scene: SceneKey) -> GameResult<()> {
        self.journal.record(format!("scene:load:{scene:?}:begin"));
        sleep(Self::DURATION).await;
        if !self.refused.lock().contains(&scene) {
            self.loaded.lock().insert(scene);
        }
        self.journal.record(format!("scene:load:{scene:?}:end"));
        Ok(())
    }

    async fn unload_scene(&self, scene: SceneKey) -> GameResult<()> {
        self.journal.record(format!("scene:unload:{scene:?}:begin"));
        sleep(Self::DURATION).await;
        self.loaded.lock().remove(&scene);
        self.journal.record(format!("scene:unload:{scene:?}:end"));
        Ok(())
    }

    fn is_loaded(&self, scene: SceneKey) -> bool {
        self.loaded.lock().contains(&scene)
    }

    fn root_controller(&self, scene: SceneKey) -> Option<SceneController> {
        if !self.is_loaded(scene) {
            return None;
        }
        self.controllers.lock().get(&scene).cloned()
    }
}
