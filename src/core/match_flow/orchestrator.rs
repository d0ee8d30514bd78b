//=========================================================================
// Match Orchestrator
//=========================================================================
//
// Drives one match from the opening countdown to the final whistle.
//
// Phases:
// ```text
//   NotStarted ─start─> Announcing ──> Playing ──goal──> Paused ──> Playing
//                                         │                 │
//                                         └── referee ends ─┴─> Ending ──> Ended
//                         (stop_match from any phase) ───────────────────> Ended
// ```
//
// Every awaited step observes the match token. Cancelling it unwinds
// whatever sequence is in flight without running later steps.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

//=== Internal Dependencies ===============================================

use super::placement::RinkLayout;
use super::rig::{AudioCue, MatchRig};
use crate::config::MatchTimings;
use crate::core::events::ScoreEvents;
use crate::core::referee::{Referee, RefereeHooks, RefereePolicy};
use crate::core::score::{FinalResult, MatchMode, MatchSettings, Player, Score};
use crate::error::{GameError, GameResult};

//=== MatchPhase ==========================================================

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    NotStarted,
    Announcing,
    Playing,
    /// Goal scored; celebration, reset and preparation in progress.
    Paused,
    Ending,
    Ended,
}

//=== MatchShared =========================================================

/// State shared between the orchestrator and its referee.
struct MatchShared {
    rig: MatchRig,
    timings: MatchTimings,
    layout: RinkLayout,
    score_events: Arc<ScoreEvents>,
    score: Mutex<Score>,
    phase: Mutex<MatchPhase>,
    result: Mutex<Option<FinalResult>>,
    referee: Mutex<Option<Arc<Referee>>>,
    token: CancellationToken,
}

impl MatchShared {
    fn phase(&self) -> MatchPhase {
        *self.phase.lock()
    }

    /// Moves to `next`. Ended is terminal.
    fn set_phase(&self, next: MatchPhase) {
        let mut phase = self.phase.lock();
        if *phase == MatchPhase::Ended {
            return;
        }
        if *phase != next {
            debug!("Match phase {:?} -> {:?}", *phase, next);
            *phase = next;
        }
    }

    /// Teleports paddles and puck to their start positions.
    fn reset_placement(&self) {
        self.rig.left.move_to(self.layout.left_start);
        self.rig.right.move_to(self.layout.right_start);
        self.rig.puck.move_to(self.layout.puck_center);
    }

    fn start_paddles(&self) {
        self.rig.left.start_moving();
        self.rig.right.start_moving();
    }

    fn stop_paddles(&self) {
        self.rig.left.stop_moving();
        self.rig.right.stop_moving();
    }

    /// Unsubscribes and discards the live referee, if any.
    fn retire_referee(&self) {
        let referee = self.referee.lock().take();
        if let Some(referee) = referee {
            referee.leave_match(|id| {
                self.score_events.unsubscribe(id);
            });
        }
    }
}

#[async_trait]
impl RefereeHooks for MatchShared {
    async fn pause_and_reset(&self, scorer: Player, token: &CancellationToken) -> GameResult<()> {
        self.set_phase(MatchPhase::Paused);
        self.stop_paddles();

        self.rig
            .announcer
            .announce_goal(scorer, self.timings.celebration, token)
            .await?;

        let reset = self.timings.reset.as_secs_f32();
        tokio::try_join!(
            self.rig.left.move_to_async(self.layout.left_start, reset, token),
            self.rig.right.move_to_async(self.layout.right_start, reset, token),
        )?;

        self.rig
            .puck
            .move_to(self.layout.serve_position(scorer.opponent()));

        self.rig
            .announcer
            .announce_get_ready(self.timings.preparation, token)
            .await?;

        self.rig.audio.play(AudioCue::Resume);
        self.start_paddles();
        self.rig.announcer.fade_out(token).await?;

        // Goals are accepted again only once the sequence is over.
        self.set_phase(MatchPhase::Playing);
        Ok(())
    }

    fn end_match(&self) {
        self.set_phase(MatchPhase::Ending);
        self.rig.stop_all();
        self.rig.audio.play(AudioCue::MatchEnd);

        let result = self.score.lock().final_result();
        *self.result.lock() = Some(result);
        info!("Match over: {:?}", result);
        self.rig.announcer.announce_end_of_match(result);

        self.set_phase(MatchPhase::Ended);
        self.retire_referee();
    }
}

//=== MatchOrchestrator ===================================================

/// Owner of one match: score, referee, and the phase sequence.
///
/// Dropping the orchestrator cancels its token and retires the referee.
pub struct MatchOrchestrator {
    shared: Arc<MatchShared>,
}

impl MatchOrchestrator {
    //--- Construction -----------------------------------------------------

    /// Creates an orchestrator whose token is a child of `parent`.
    pub fn new(
        rig: MatchRig,
        timings: MatchTimings,
        layout: RinkLayout,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            shared: Arc::new(MatchShared {
                rig,
                timings,
                layout,
                score_events: Arc::new(ScoreEvents::new()),
                score: Mutex::new(Score::default()),
                phase: Mutex::new(MatchPhase::NotStarted),
                result: Mutex::new(None),
                referee: Mutex::new(None),
                token: parent.child_token(),
            }),
        }
    }

    //--- Match Start ------------------------------------------------------

    /// Runs the opening sequence and puts the puck in play.
    ///
    /// 1. Paddles and puck to start positions
    /// 2. Match-start countdown, then "get ready"
    /// 3. Referee for `settings.mode` appointed (clock started in time mode)
    /// 4. Start cue, paddles enabled, overlay faded out
    ///
    /// # Errors
    ///
    /// [`GameError::Cancelled`] if the match is stopped mid-sequence.
    pub async fn start_match(&self, settings: MatchSettings) -> GameResult<()> {
        let shared = &self.shared;
        let token = shared.token.clone();

        if shared.phase() != MatchPhase::NotStarted {
            warn!("Match already started, ignoring start request");
            return Ok(());
        }

        info!("Starting match: {:?}", settings);
        shared.reset_placement();
        shared.set_phase(MatchPhase::Announcing);

        shared
            .rig
            .announcer
            .announce_match_start(shared.timings.match_start, &token)
            .await?;
        shared
            .rig
            .announcer
            .announce_get_ready(shared.timings.preparation, &token)
            .await?;

        // Announcers that ignore the token must not get a referee appointed
        // on a stopped match.
        if token.is_cancelled() {
            return Err(GameError::Cancelled);
        }

        let referee = self.appoint_referee(&settings);
        if settings.mode == MatchMode::Time {
            shared.rig.timer.show(settings.value);
            referee.start_clock();
        }

        shared.rig.audio.play(AudioCue::MatchStart);
        shared.start_paddles();
        shared.rig.announcer.fade_out(&token).await?;
        shared.set_phase(MatchPhase::Playing);
        Ok(())
    }

    fn appoint_referee(&self, settings: &MatchSettings) -> Arc<Referee> {
        let shared = &self.shared;

        let timer = Arc::clone(&shared.rig.timer);
        let policy =
            RefereePolicy::from_settings(settings, Box::new(move |secs| timer.set_time(secs)));

        let hooks: Arc<dyn RefereeHooks> = Arc::clone(shared) as Arc<dyn RefereeHooks>;
        let events = Arc::clone(&shared.score_events);
        let referee = Referee::new(policy, hooks, &shared.token, |handler| {
            events.subscribe(handler)
        });

        let previous = shared.referee.lock().replace(Arc::clone(&referee));
        if previous.is_some() {
            warn!("Replacing a live referee");
        }
        referee
    }

    //--- Goals ------------------------------------------------------------

    /// Records a goal and hands it to the referee.
    ///
    /// Goals outside the Playing phase are ignored.
    pub fn goal_scored(&self, scorer: Player) {
        let shared = &self.shared;

        {
            let mut phase = shared.phase.lock();
            if *phase != MatchPhase::Playing {
                debug!("Goal for {:?} ignored in phase {:?}", scorer, *phase);
                return;
            }
            *phase = MatchPhase::Paused;
        }

        let score = {
            let mut score = shared.score.lock();
            *score = score.apply_goal(scorer);
            *score
        };

        info!("Goal {:?}: {} - {}", scorer, score.left, score.right);
        shared.score_events.emit(scorer, score);
    }

    //--- Termination ------------------------------------------------------

    /// Abandons the match (user backed out).
    ///
    /// Freezes placement, plays the stop cue, cancels every in-flight step
    /// and waits for the audio fade. `token` bounds only the fade.
    pub async fn stop_match(&self, fade: Duration, token: &CancellationToken) -> GameResult<()> {
        let shared = &self.shared;
        info!("Stopping match");

        shared.rig.stop_all();
        shared.rig.audio.play(AudioCue::MatchStopped);
        shared.token.cancel();
        shared.retire_referee();
        shared.set_phase(MatchPhase::Ended);

        tokio::select! {
            _ = token.cancelled() => Err(GameError::Cancelled),
            _ = shared.rig.audio.fade_out_all(fade) => Ok(()),
        }
    }

    /// Ends the match by referee decision.
    pub fn end_match(&self) {
        self.shared.end_match();
    }

    /// Cancels all match activity and releases the referee without cues.
    pub fn shutdown(&self) {
        let shared = &self.shared;
        if !shared.token.is_cancelled() {
            debug!("Match orchestrator shutting down");
            shared.token.cancel();
            shared.rig.stop_all();
        }
        shared.retire_referee();
        shared.set_phase(MatchPhase::Ended);
    }

    //--- Query API --------------------------------------------------------

    pub fn phase(&self) -> MatchPhase {
        self.shared.phase()
    }

    pub fn score(&self) -> Score {
        *self.shared.score.lock()
    }

    /// Result announced at the final whistle, if the referee ended the match.
    pub fn final_result(&self) -> Option<FinalResult> {
        *self.shared.result.lock()
    }

    /// The live referee, if one is on duty.
    pub fn referee(&self) -> Option<Arc<Referee>> {
        self.shared.referee.lock().clone()
    }

    /// Goal notifications for this match.
    pub fn score_events(&self) -> &Arc<ScoreEvents> {
        &self.shared.score_events
    }

    /// The match cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.shared.token
    }
}

impl Drop for MatchOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::referee::ClockState;
    use crate::testing::{entries_after, RigFixture};
    use tokio::time::sleep;

    fn timings() -> MatchTimings {
        MatchTimings {
            match_start: Duration::from_millis(300),
            preparation: Duration::from_millis(100),
            celebration: Duration::from_millis(200),
            reset: Duration::from_millis(100),
        }
    }

    fn orchestrator(fixture: &RigFixture) -> MatchOrchestrator {
        MatchOrchestrator::new(
            fixture.rig(),
            timings(),
            RinkLayout::default(),
            &CancellationToken::new(),
        )
    }

    //=====================================================================
    // Opening Sequence
    //=====================================================================

    #[tokio::test(start_paused = true)]
    async fn start_sequence_runs_in_order() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);

        orchestrator
            .start_match(MatchSettings::new(MatchMode::HighScore, 3))
            .await
            .unwrap();

        assert_eq!(
            fixture.journal.entries(),
            vec![
                "left:place",
                "right:place",
                "puck:place",
                "announce:start",
                "announce:ready",
                "audio:MatchStart",
                "left:start",
                "right:start",
                "announce:fade",
            ]
        );
        assert_eq!(orchestrator.phase(), MatchPhase::Playing);
        assert_eq!(orchestrator.score_events().handler_count(), 1);
        assert_eq!(fixture.left.position(), RinkLayout::default().left_start);
    }

    #[tokio::test(start_paused = true)]
    async fn time_mode_shows_timer_and_runs_clock() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);

        orchestrator
            .start_match(MatchSettings::new(MatchMode::Time, 2))
            .await
            .unwrap();
        sleep(Duration::from_millis(3050)).await;

        assert!(fixture.journal.entries().contains(&"timer:show:2".to_string()));
        assert_eq!(*fixture.timer_updates.lock(), vec![119, 118, 117]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        let settings = MatchSettings::new(MatchMode::Endless, 0);

        orchestrator.start_match(settings).await.unwrap();
        orchestrator.start_match(settings).await.unwrap();

        assert_eq!(orchestrator.score_events().handler_count(), 1);
    }

    //=====================================================================
    // Goals
    //=====================================================================

    #[tokio::test(start_paused = true)]
    async fn goal_runs_pause_and_reset_then_serves_to_loser() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::HighScore, 5))
            .await
            .unwrap();
        let mark = fixture.journal.len();

        orchestrator.goal_scored(Player::Left);
        sleep(Duration::from_millis(1)).await;
        assert_eq!(orchestrator.phase(), MatchPhase::Paused);

        sleep(Duration::from_secs(2)).await;

        assert_eq!(
            entries_after(&fixture.journal, mark),
            vec![
                "left:stop",
                "right:stop",
                "announce:goal:Left",
                "left:glide",
                "right:glide",
                "puck:place",
                "announce:ready",
                "audio:Resume",
                "left:start",
                "right:start",
                "announce:fade",
            ]
        );
        let layout = RinkLayout::default();
        assert_eq!(fixture.puck.position(), layout.serve_position(Player::Right));
        assert_eq!(orchestrator.phase(), MatchPhase::Playing);
        assert_eq!(orchestrator.score(), Score::new(1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn deciding_goal_ends_match_and_unsubscribes() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::HighScore, 1))
            .await
            .unwrap();
        let mark = fixture.journal.len();

        orchestrator.goal_scored(Player::Right);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(orchestrator.phase(), MatchPhase::Ended);
        assert_eq!(orchestrator.final_result(), Some(FinalResult::RightPlayerWin));
        assert_eq!(orchestrator.score_events().handler_count(), 0);
        assert!(orchestrator.referee().is_none());
        assert_eq!(
            entries_after(&fixture.journal, mark),
            vec![
                "left:stop",
                "right:stop",
                "puck:stop",
                "audio:MatchEnd",
                "announce:end:RightPlayerWin",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn goals_while_paused_are_ignored() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::Endless, 0))
            .await
            .unwrap();

        orchestrator.goal_scored(Player::Left);
        orchestrator.goal_scored(Player::Left);
        sleep(Duration::from_secs(2)).await;

        assert_eq!(orchestrator.score(), Score::new(1, 0));
        let goals = fixture
            .journal
            .entries()
            .iter()
            .filter(|e| e.starts_with("announce:goal"))
            .count();
        assert_eq!(goals, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn goal_before_start_is_ignored() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);

        orchestrator.goal_scored(Player::Left);

        assert_eq!(orchestrator.score(), Score::default());
    }

    #[tokio::test(start_paused = true)]
    async fn goal_during_resume_fade_is_ignored() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::Endless, 0))
            .await
            .unwrap();

        orchestrator.goal_scored(Player::Left);
        sleep(Duration::from_millis(450)).await;
        assert_eq!(fixture.journal.entries().last().unwrap(), "announce:fade");
        assert_eq!(orchestrator.phase(), MatchPhase::Paused);

        orchestrator.goal_scored(Player::Right);
        sleep(Duration::from_secs(1)).await;

        assert_eq!(orchestrator.score(), Score::new(1, 0));
        let goals = fixture
            .journal
            .entries()
            .iter()
            .filter(|e| e.starts_with("announce:goal"))
            .count();
        assert_eq!(goals, 1);
        assert_eq!(orchestrator.phase(), MatchPhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn goal_during_resume_fade_keeps_clock_frozen() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::Time, 1))
            .await
            .unwrap();
        let referee = orchestrator.referee().unwrap();
        let clock = referee.clock().unwrap();

        orchestrator.goal_scored(Player::Left);
        assert_eq!(clock.state(), ClockState::Paused);
        sleep(Duration::from_millis(450)).await;
        let frozen = clock.remaining();

        orchestrator.goal_scored(Player::Right);
        sleep(Duration::from_millis(40)).await;
        assert_eq!(clock.state(), ClockState::Paused);
        assert_eq!(clock.remaining(), frozen);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(clock.state(), ClockState::Running);
        assert!(clock.remaining() < frozen);
        assert_eq!(orchestrator.score(), Score::new(1, 0));
    }

    //=====================================================================
    // Termination
    //=====================================================================

    #[tokio::test(start_paused = true)]
    async fn stop_during_countdown_unwinds_without_later_steps() {
        let fixture = RigFixture::new();
        let orchestrator = Arc::new(orchestrator(&fixture));

        let starter = Arc::clone(&orchestrator);
        let start = tokio::spawn(async move {
            starter
                .start_match(MatchSettings::new(MatchMode::HighScore, 3))
                .await
        });
        sleep(Duration::from_millis(100)).await;

        orchestrator
            .stop_match(Duration::from_millis(500), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(start.await.unwrap(), Err(GameError::Cancelled));
        let entries = fixture.journal.entries();
        assert!(!entries.contains(&"announce:ready".to_string()));
        assert!(entries.contains(&"audio:MatchStopped".to_string()));
        assert_eq!(entries.last().unwrap(), "audio:fade");
        assert_eq!(orchestrator.phase(), MatchPhase::Ended);
        assert!(orchestrator.referee().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_honoured_when_announcer_ignores_token() {
        let fixture = RigFixture::new();
        fixture.announcer_ignores_token();
        let orchestrator = Arc::new(orchestrator(&fixture));

        let starter = Arc::clone(&orchestrator);
        let start = tokio::spawn(async move {
            starter
                .start_match(MatchSettings::new(MatchMode::HighScore, 3))
                .await
        });
        sleep(Duration::from_millis(100)).await;

        orchestrator
            .stop_match(Duration::ZERO, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(start.await.unwrap(), Err(GameError::Cancelled));
        assert!(fixture.journal.contains("announce:ready"));
        assert!(!fixture.journal.contains("audio:MatchStart"));
        assert!(orchestrator.referee().is_none());
        assert_eq!(orchestrator.score_events().handler_count(), 0);
        assert_eq!(orchestrator.phase(), MatchPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_reset_releases_referee() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::Endless, 0))
            .await
            .unwrap();

        orchestrator.goal_scored(Player::Right);
        sleep(Duration::from_millis(50)).await;
        orchestrator
            .stop_match(Duration::ZERO, &CancellationToken::new())
            .await
            .unwrap();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(orchestrator.score_events().handler_count(), 0);
        assert!(!fixture.journal.entries().contains(&"audio:Resume".to_string()));
        assert!(!fixture.left.is_moving());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_retires_referee() {
        let fixture = RigFixture::new();
        let orchestrator = orchestrator(&fixture);
        orchestrator
            .start_match(MatchSettings::new(MatchMode::Endless, 0))
            .await
            .unwrap();
        let events = Arc::clone(orchestrator.score_events());
        let token = orchestrator.token().clone();

        drop(orchestrator);

        assert_eq!(events.handler_count(), 0);
        assert!(token.is_cancelled());
    }
}
