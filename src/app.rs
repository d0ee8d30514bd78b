//=========================================================================
// Application Orchestrator
//
// Entry point tying scenes, matches and UI events together.
//
// Architecture:
// ```text
//     AppBuilder  ──build()──>  App  ──run()──>  [tick loop @ TPS]
//         │                      │
//         ├─ with_tps()          ├─ startup: load Menu
//         ├─ with_stop_fade()    ├─ drain AppEvents every tick
//         └─ with_match_timings()└─ shutdown: cancel root, await tasks
// ```
//
// States:
//   Uninitialized ──startup──> Menu <──start / back──> Match
//
// Every transition holds the loading guard for its whole fade bracket.
// Back requests arriving while it is held are ignored.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

//=== Internal Dependencies ===============================================

use crate::config::MatchTimings;
use crate::core::match_flow::{MatchOrchestrator, MatchRig, RinkLayout};
use crate::core::platform_bridge::{AppEvent, EventCollector, TickControl};
use crate::core::scene::{MenuRig, SceneKey, SceneLoader, SceneManager};
use crate::core::score::{MatchSettings, Player};
use crate::error::{GameError, GameResult};

//=== ScreenFader =========================================================

/// Full-screen transition overlay.
#[async_trait]
pub trait ScreenFader: Send + Sync {
    /// Covers the screen.
    async fn fade_in(&self, token: &CancellationToken) -> GameResult<()>;

    /// Reveals the screen.
    async fn fade_out(&self, token: &CancellationToken) -> GameResult<()>;
}

//=== AppState ============================================================

/// Which scene the application is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Uninitialized,
    Menu,
    Match,
}

//=== AppBuilder ==========================================================

/// Builder for configuring and constructing an [`App`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (event polls per second)
/// - **Channel capacity**: 128 events
/// - **Stop fade**: 0.5 s audio fade when backing out of a match
/// - **Back leaves app**: false (back at the top-level menu shows the
///   quit popup)
/// - **Match timings**: [`MatchTimings::default`]
/// - **Rink layout**: [`RinkLayout::default`]
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use rink_referee::app::{AppBuilder, ScreenFader};
/// # use rink_referee::core::scene::SceneLoader;
/// # async fn demo(loader: Arc<dyn SceneLoader>, fader: Arc<dyn ScreenFader>) {
/// let app = AppBuilder::new()
///     .with_tps(30.0)
///     .with_back_leaves_app(true)
///     .build(loader, fader);
///
/// let events = app.event_sender();
/// // hand `events` to the UI layer...
/// # drop(events);
/// app.run().await.expect("fatal application error");
/// # }
/// ```
pub struct AppBuilder {
    tps: f64,
    channel_capacity: usize,
    stop_fade: Duration,
    back_leaves_app: bool,
    timings: MatchTimings,
    layout: RinkLayout,
}

impl AppBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            channel_capacity: 128,
            stop_fade: Duration::from_millis(500),
            back_leaves_app: false,
            timings: MatchTimings::default(),
            layout: RinkLayout::default(),
        }
    }

    /// Sets how many times per second UI events are drained.
    ///
    /// Default: 60.0
    ///
    /// # Panics
    ///
    /// Panics if `tps` is not a positive finite number.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0 && tps.is_finite(), "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets the capacity of the UI → application event channel.
    ///
    /// Default: 128
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Sets the audio fade used when the user backs out of a match.
    ///
    /// Default: 0.5 s
    pub fn with_stop_fade(mut self, fade: Duration) -> Self {
        self.stop_fade = fade;
        self
    }

    /// When true, back at the top-level menu quits instead of asking.
    ///
    /// Default: false
    pub fn with_back_leaves_app(mut self, leaves: bool) -> Self {
        self.back_leaves_app = leaves;
        self
    }

    pub fn with_match_timings(mut self, timings: MatchTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_rink_layout(mut self, layout: RinkLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Builds the application around the host's scene loader and fader.
    pub fn build(self, loader: Arc<dyn SceneLoader>, fader: Arc<dyn ScreenFader>) -> App {
        info!(
            "Building app (TPS: {}, channel: {})",
            self.tps, self.channel_capacity
        );

        let (sender, receiver) = bounded(self.channel_capacity);

        App {
            shared: Arc::new(AppShared {
                stop_fade: self.stop_fade,
                back_leaves_app: self.back_leaves_app,
                timings: self.timings,
                layout: self.layout,
                scenes: SceneManager::new(loader),
                fader,
                token: CancellationToken::new(),
                tasks: TaskTracker::new(),
                loading: Arc::new(AtomicBool::new(false)),
                inner: Mutex::new(AppInner::default()),
                fatal: Mutex::new(None),
            }),
            sender,
            receiver,
            tps: self.tps,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Loading Guard =======================================================

/// Holds the loading flag for the lifetime of one transition.
struct LoadingGuard {
    flag: Arc<AtomicBool>,
}

impl LoadingGuard {
    /// Raises the flag, or returns `None` if a transition already holds it.
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

//=== Shared State ========================================================

/// UI events currently subscribed to.
#[derive(Debug, Default)]
struct Wiring {
    start_match: bool,
    leave_match: bool,
    restart_match: bool,
}

struct AppInner {
    state: AppState,
    menu: Option<Arc<MenuRig>>,
    active_match: Option<Arc<MatchOrchestrator>>,
    last_settings: Option<MatchSettings>,
    wiring: Wiring,
}

impl Default for AppInner {
    fn default() -> Self {
        Self {
            state: AppState::Uninitialized,
            menu: None,
            active_match: None,
            last_settings: None,
            wiring: Wiring::default(),
        }
    }
}

struct AppShared {
    stop_fade: Duration,
    back_leaves_app: bool,
    timings: MatchTimings,
    layout: RinkLayout,
    scenes: SceneManager,
    fader: Arc<dyn ScreenFader>,
    token: CancellationToken,
    tasks: TaskTracker,
    loading: Arc<AtomicBool>,
    inner: Mutex<AppInner>,
    fatal: Mutex<Option<GameError>>,
}

impl AppShared {
    //--- Task Boundary ----------------------------------------------------

    /// Runs a transition on the tracker; cancellation is benign, anything
    /// else is fatal.
    fn spawn_transition<F>(self: &Arc<Self>, name: &'static str, transition: F)
    where
        F: Future<Output = GameResult<()>> + Send + 'static,
    {
        let shared = Arc::clone(self);
        self.tasks.spawn(async move {
            match transition.await {
                Ok(()) => debug!("{} complete", name),
                Err(e) if e.is_cancellation() => debug!("{} cancelled", name),
                Err(e) => shared.record_fatal(e),
            }
        });
    }

    /// Keeps the first fatal error and shuts the application down.
    fn record_fatal(&self, err: GameError) {
        error!("Fatal application error: {}", err);
        self.fatal.lock().get_or_insert(err);
        self.token.cancel();
    }

    fn set_state(inner: &mut AppInner, next: AppState) {
        if inner.state != next {
            info!("App state {:?} -> {:?}", inner.state, next);
            inner.state = next;
        }
    }

    //--- Event Dispatch ---------------------------------------------------

    fn handle_event(self: &Arc<Self>, event: AppEvent) {
        debug!("Handling {:?}", event);
        match event {
            AppEvent::Back => self.handle_back(),
            AppEvent::StartMatch(settings) => self.handle_start_match(settings),
            AppEvent::RestartMatch => self.handle_restart_match(),
            AppEvent::LeaveMatch => self.handle_leave_match(),
            AppEvent::Quit => {
                info!("Quit requested");
                self.token.cancel();
            }
        }
    }

    fn handle_back(self: &Arc<Self>) {
        if self.loading.load(Ordering::Acquire) {
            debug!("Back ignored while loading");
            return;
        }

        let (state, menu) = {
            let inner = self.inner.lock();
            (inner.state, inner.menu.clone())
        };

        match state {
            AppState::Uninitialized => debug!("Back ignored before startup"),
            AppState::Menu => {
                let Some(menu) = menu else {
                    warn!("Menu state without a menu controller");
                    return;
                };
                if !menu.menu.is_at_top_level() {
                    menu.menu.return_to_top();
                } else if self.back_leaves_app {
                    info!("Back at top-level menu, leaving");
                    self.token.cancel();
                } else {
                    menu.menu.show_quit_popup();
                }
            }
            AppState::Match => self.begin_return_to_menu(),
        }
    }

    fn handle_start_match(self: &Arc<Self>, settings: MatchSettings) {
        if !self.inner.lock().wiring.start_match {
            debug!("Start request ignored, not subscribed");
            return;
        }
        let Some(guard) = LoadingGuard::acquire(&self.loading) else {
            debug!("Start request ignored while loading");
            return;
        };

        {
            let mut inner = self.inner.lock();
            inner.wiring.start_match = false;
            inner.last_settings = Some(settings);
        }

        let shared = Arc::clone(self);
        self.spawn_transition("start match", async move {
            shared.enter_match(settings, guard).await
        });
    }

    fn handle_restart_match(self: &Arc<Self>) {
        let settings = {
            let inner = self.inner.lock();
            if !inner.wiring.restart_match {
                debug!("Restart request ignored, not subscribed");
                return;
            }
            inner.last_settings
        };
        let Some(settings) = settings else {
            warn!("Restart requested with no previous settings");
            return;
        };
        let Some(guard) = LoadingGuard::acquire(&self.loading) else {
            debug!("Restart request ignored while loading");
            return;
        };

        let outgoing = {
            let mut inner = self.inner.lock();
            inner.wiring.leave_match = false;
            inner.wiring.restart_match = false;
            inner.active_match.take()
        };
        if let Some(outgoing) = outgoing {
            outgoing.shutdown();
        }

        info!("Restarting match: {:?}", settings);
        let shared = Arc::clone(self);
        self.spawn_transition("restart match", async move {
            shared.enter_match(settings, guard).await
        });
    }

    fn handle_leave_match(self: &Arc<Self>) {
        if !self.inner.lock().wiring.leave_match {
            debug!("Leave request ignored, not subscribed");
            return;
        }
        self.begin_return_to_menu();
    }

    fn begin_return_to_menu(self: &Arc<Self>) {
        let Some(guard) = LoadingGuard::acquire(&self.loading) else {
            debug!("Return to menu ignored while loading");
            return;
        };

        let outgoing = {
            let mut inner = self.inner.lock();
            inner.wiring.leave_match = false;
            inner.wiring.restart_match = false;
            inner.active_match.take()
        };

        let shared = Arc::clone(self);
        self.spawn_transition("return to menu", async move {
            shared.return_to_menu(outgoing, guard).await
        });
    }

    //--- Transitions ------------------------------------------------------

    async fn enter_menu(&self) -> GameResult<()> {
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            warn!("Startup requested during a transition");
            return Ok(());
        };
        if self.inner.lock().state != AppState::Uninitialized {
            warn!("Startup requested twice");
            return Ok(());
        }

        self.fader.fade_in(&self.token).await?;
        let menu = self.scenes.load_managed_scene::<MenuRig>(SceneKey::Menu).await?;
        self.show_menu(menu);
        self.fader.fade_out(&self.token).await
    }

    fn show_menu(&self, menu: Arc<MenuRig>) {
        let mut inner = self.inner.lock();
        inner.menu = Some(menu);
        inner.wiring.start_match = true;
        Self::set_state(&mut inner, AppState::Menu);
    }

    async fn enter_match(&self, settings: MatchSettings, guard: LoadingGuard) -> GameResult<()> {
        self.fader.fade_in(&self.token).await?;
        let rig = self.scenes.load_managed_scene::<MatchRig>(SceneKey::Match).await?;

        let orchestrator = Arc::new(MatchOrchestrator::new(
            MatchRig::clone(&rig),
            self.timings,
            self.layout,
            &self.token,
        ));
        {
            let mut inner = self.inner.lock();
            inner.menu = None;
            inner.active_match = Some(Arc::clone(&orchestrator));
            inner.wiring.leave_match = true;
            inner.wiring.restart_match = true;
            Self::set_state(&mut inner, AppState::Match);
        }

        self.fader.fade_out(&self.token).await?;
        drop(guard);

        orchestrator.start_match(settings).await
    }

    async fn return_to_menu(
        &self,
        outgoing: Option<Arc<MatchOrchestrator>>,
        guard: LoadingGuard,
    ) -> GameResult<()> {
        self.fader.fade_in(&self.token).await?;

        let stop = async {
            match &outgoing {
                Some(orchestrator) => orchestrator.stop_match(self.stop_fade, &self.token).await,
                None => Ok(()),
            }
        };
        let load = self.scenes.load_managed_scene::<MenuRig>(SceneKey::Menu);
        let (stopped, menu) = tokio::join!(stop, load);
        stopped?;
        let menu = menu?;

        drop(outgoing);
        self.show_menu(menu);

        self.fader.fade_out(&self.token).await?;
        drop(guard);
        Ok(())
    }

    //--- Shutdown ---------------------------------------------------------

    async fn shutdown(&self) {
        info!("Shutting down");
        self.token.cancel();

        let outgoing = self.inner.lock().active_match.take();
        if let Some(outgoing) = outgoing {
            outgoing.shutdown();
        }

        self.tasks.close();
        self.tasks.wait().await;

        if let Err(e) = self.scenes.unload_current().await {
            warn!("Failed to unload scene during shutdown: {}", e);
        }
        info!("Shutdown complete");
    }
}

//=== App =================================================================

/// Application runtime.
///
/// Create via [`AppBuilder`]. The host feeds UI events through
/// [`App::event_sender`] and goals through [`App::goal_scored`].
pub struct App {
    shared: Arc<AppShared>,
    sender: Sender<AppEvent>,
    receiver: Receiver<AppEvent>,
    tps: f64,
}

impl App {
    //--- Host Surface -----------------------------------------------------

    /// A sender for UI events. The tick loop exits once every sender is
    /// dropped.
    pub fn event_sender(&self) -> Sender<AppEvent> {
        self.sender.clone()
    }

    /// Loads the Menu scene. Called by [`App::run`]; exposed for hosts that
    /// drive events themselves.
    pub async fn startup(&self) -> GameResult<()> {
        info!("Starting up");
        self.shared.enter_menu().await
    }

    /// Applies one UI event. Transitions run as tracked background tasks.
    pub fn handle_event(&self, event: AppEvent) {
        self.shared.handle_event(event);
    }

    /// Forwards a goal to the active match, if any.
    pub fn goal_scored(&self, scorer: Player) {
        let active = self.shared.inner.lock().active_match.clone();
        match active {
            Some(active) => active.goal_scored(scorer),
            None => debug!("Goal for {:?} outside a match", scorer),
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs startup and the event loop until `Quit`, every sender gone,
    /// or a fatal error.
    ///
    /// # Errors
    ///
    /// The first fatal error raised by startup or any transition.
    pub async fn run(self) -> GameResult<()> {
        info!("Starting app runtime (TPS: {})", self.tps);

        let App {
            shared,
            sender,
            receiver,
            tps,
        } = self;
        drop(sender);

        match shared.enter_menu().await {
            Err(e) if !e.is_cancellation() => shared.record_fatal(e),
            _ => {}
        }

        let mut collector = EventCollector::new(receiver);
        let mut ticker = interval(Duration::from_secs_f64(1.0 / tps));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shared.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let control = collector.collect_frame();
            for event in collector.take_events() {
                shared.handle_event(event);
            }
            if control == TickControl::Exit {
                info!("Event loop exiting");
                break;
            }
        }

        shared.shutdown().await;

        let fatal = shared.fatal.lock().take();
        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Cancels every transition and match, then waits for them to unwind.
    pub async fn shutdown(&self) {
        self.shared.shutdown().await;
    }

    //--- Query API --------------------------------------------------------

    pub fn state(&self) -> AppState {
        self.shared.inner.lock().state
    }

    /// True while a transition holds the loading guard.
    pub fn is_loading(&self) -> bool {
        self.shared.loading.load(Ordering::Acquire)
    }

    /// The match currently in progress.
    pub fn active_match(&self) -> Option<Arc<MatchOrchestrator>> {
        self.shared.inner.lock().active_match.clone()
    }

    /// Settings remembered for "play again".
    pub fn last_settings(&self) -> Option<MatchSettings> {
        self.shared.inner.lock().last_settings
    }

    /// The root cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.shared.token
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
