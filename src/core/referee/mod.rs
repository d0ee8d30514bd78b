//=========================================================================
// Referee
//=========================================================================
//
// Per-match policy deciding when a match ends and mediating the pause
// around every goal.
//
// Architecture:
//   ScoreEvents ──handler──> Referee::process_score()
//                               ├─ not over → hooks.pause_and_reset().await
//                               └─ over     → hooks.end_match()
//
// Variants (closed set, chosen by match mode):
//   Endless | HighScore | BestOfScore | Time(MatchClock)
//
// Lifecycle:
//   new() subscribes exactly once; leave_match() unsubscribes exactly
//   once, stops the clock and cancels every task the referee spawned.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use log::{debug, error, info};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

//=== Internal Dependencies ===============================================

use crate::core::events::{ScoreHandler, SubscriptionId};
use crate::core::score::{MatchMode, MatchSettings, Player, Score};
use crate::error::GameResult;

//=== Module Declarations =================================================

mod match_clock;

//=== Public API ==========================================================

pub use match_clock::{
    ClockExit, ClockState, ClockUpdate, MatchClock, TICKS_PER_UPDATE, TICK_INTERVAL,
};

//=== RefereeHooks ========================================================

/// Callbacks a referee drives on its match.
#[async_trait]
pub trait RefereeHooks: Send + Sync {
    /// Celebration, reset and preparation after a goal. Play is stopped
    /// until this returns.
    async fn pause_and_reset(&self, scorer: Player, token: &CancellationToken) -> GameResult<()>;

    /// Terminates the match immediately.
    fn end_match(&self);
}

//=== RefereePolicy =======================================================

/// Win condition of a referee.
pub enum RefereePolicy {
    /// Never ends on its own.
    Endless,
    /// Ends when the scorer reaches `threshold` goals.
    HighScore { threshold: u32 },
    /// Ends when either player reaches `majority` goals.
    BestOfScore { majority: u32 },
    /// Ends when the clock runs out; goals only pause the clock.
    Time(MatchClock),
}

impl RefereePolicy {
    /// Builds the policy for `settings`.
    ///
    /// `on_clock` receives the remaining seconds in time mode and is
    /// dropped for every other mode.
    pub fn from_settings(settings: &MatchSettings, on_clock: ClockUpdate) -> Self {
        match settings.mode {
            MatchMode::Endless => Self::Endless,
            MatchMode::HighScore => Self::HighScore {
                threshold: settings.value,
            },
            MatchMode::BestOfScore => Self::BestOfScore {
                majority: settings.best_of_majority(),
            },
            MatchMode::Time => Self::Time(MatchClock::new(settings.time_limit(), on_clock)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Endless => "Endless",
            Self::HighScore { .. } => "HighScore",
            Self::BestOfScore { .. } => "BestOfScore",
            Self::Time(_) => "Time",
        }
    }

    /// True when `score` ends the match under a goal-count policy.
    fn decides(&self, scorer: Player, score: &Score) -> bool {
        match self {
            Self::Endless | Self::Time(_) => false,
            Self::HighScore { threshold } => score.goals(scorer) >= *threshold,
            Self::BestOfScore { majority } => score.left >= *majority || score.right >= *majority,
        }
    }
}

//=== Referee =============================================================

/// Live referee for one match.
pub struct Referee {
    policy: RefereePolicy,
    hooks: Arc<dyn RefereeHooks>,
    subscription: Mutex<Option<SubscriptionId>>,
    token: CancellationToken,
    tasks: TaskTracker,
    finished: AtomicBool,
}

impl Referee {
    //--- Construction -----------------------------------------------------

    /// Creates a referee and registers its score handler through `subscribe`.
    ///
    /// The referee's token is a child of `parent`; cancelling the match
    /// cancels every sequence the referee started. The handler holds only a
    /// weak reference, so a dropped referee never receives goals.
    pub fn new<F>(
        policy: RefereePolicy,
        hooks: Arc<dyn RefereeHooks>,
        parent: &CancellationToken,
        subscribe: F,
    ) -> Arc<Self>
    where
        F: FnOnce(ScoreHandler) -> SubscriptionId,
    {
        let referee = Arc::new(Self {
            policy,
            hooks,
            subscription: Mutex::new(None),
            token: parent.child_token(),
            tasks: TaskTracker::new(),
            finished: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&referee);
        let id = subscribe(Arc::new(move |player, score| {
            Self::on_goal(&weak, player, score)
        }));
        *referee.subscription.lock() = Some(id);

        info!("{} referee on duty", referee.policy.name());
        referee
    }

    //--- Score Processing -------------------------------------------------

    fn on_goal(weak: &Weak<Self>, player: Player, score: Score) {
        let Some(referee) = weak.upgrade() else {
            return;
        };
        if referee.is_stopped() {
            debug!("Goal for {:?} ignored, referee stopped", player);
            return;
        }

        // Held from the goal itself until its sequence is over.
        if let Some(clock) = referee.clock() {
            clock.pause();
        }

        let task_referee = Arc::clone(&referee);
        referee.tasks.spawn(async move {
            let token = task_referee.token.clone();
            let result = task_referee.process_score(player, score, &token).await;
            if let Some(clock) = task_referee.clock() {
                clock.resume();
            }
            match result {
                Ok(()) => {}
                Err(e) if e.is_cancellation() => debug!("Goal sequence cancelled"),
                Err(e) => error!("Goal sequence failed: {}", e),
            }
        });
    }

    /// Evaluates a goal under this referee's policy.
    ///
    /// When the match continues, returns only after the pause-and-reset
    /// sequence completes. When the goal decides the match, `end_match` is
    /// invoked and no reset runs.
    pub async fn process_score(
        &self,
        scorer: Player,
        score: Score,
        token: &CancellationToken,
    ) -> GameResult<()> {
        if self.is_stopped() {
            debug!("Goal for {:?} after final whistle ignored", scorer);
            return Ok(());
        }

        if self.policy.decides(scorer, &score) {
            info!("{:?} decides the match at {:?}", scorer, score);
            self.finish();
            return Ok(());
        }

        match &self.policy {
            RefereePolicy::Time(clock) => {
                clock.pause();
                let result = self.hooks.pause_and_reset(scorer, token).await;
                clock.resume();
                result
            }
            _ => self.hooks.pause_and_reset(scorer, token).await,
        }
    }

    //--- Time Mode --------------------------------------------------------

    /// Starts the countdown as a detached task. No-op for other policies.
    ///
    /// When the clock expires the match ends exactly once.
    pub fn start_clock(self: &Arc<Self>) {
        if !matches!(self.policy, RefereePolicy::Time(_)) {
            return;
        }

        let referee = Arc::clone(self);
        self.tasks.spawn(async move {
            let RefereePolicy::Time(clock) = &referee.policy else {
                return;
            };
            if clock.run(&referee.token).await == ClockExit::Expired {
                referee.finish();
            }
        });
    }

    /// The countdown, in time mode.
    pub fn clock(&self) -> Option<&MatchClock> {
        match &self.policy {
            RefereePolicy::Time(clock) => Some(clock),
            _ => None,
        }
    }

    //--- Teardown ---------------------------------------------------------

    /// Releases the referee when the match is left or over.
    ///
    /// `unsubscribe` receives the subscription token on the first call only;
    /// later calls are no-ops. Stops the clock and cancels in-flight goal
    /// sequences so no hook fires afterwards.
    pub fn leave_match<F>(&self, unsubscribe: F)
    where
        F: FnOnce(SubscriptionId),
    {
        if let Some(id) = self.subscription.lock().take() {
            unsubscribe(id);
            info!("{} referee left the match", self.policy.name());
        }
        if let RefereePolicy::Time(clock) = &self.policy {
            clock.stop();
        }
        self.token.cancel();
        self.tasks.close();
    }

    //--- Query API --------------------------------------------------------

    /// True once the match ended or the referee left.
    pub fn is_stopped(&self) -> bool {
        self.finished.load(Ordering::Acquire) || self.token.is_cancelled()
    }

    /// Whether the score handler is still registered.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }

    fn finish(&self) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        if let RefereePolicy::Time(clock) = &self.policy {
            clock.stop();
        }
        self.hooks.end_match();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
