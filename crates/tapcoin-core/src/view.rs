//! One open page: a tap engine, a session, and a regeneration timer.
//!
//! The engine and the session live behind one [`std::sync::Mutex`], so a
//! tap reads the identity it persists under in the same critical section
//! that produced its totals. No lock is held across an `.await`. Every
//! state change is published as a fresh [`ViewState`] on a broadcast
//! channel.
//!
//! Dismantling a view stops its timer, clears its `alive` flag so
//! persistence writes still in flight complete unobserved, and signals
//! [`GameView::closed`] watchers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tapcoin_types::{
    Credentials, Identity, Position, TapEventId, TapOutcome, UserState, ViewId, ViewState,
};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;

use crate::engine::TapEngine;
use crate::regen::RegenTimer;
use crate::rules::GameRules;
use crate::session::{Session, SessionError, SessionManager};

/// Broadcast channel capacity per view.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Counters and identity, always changed together.
struct Play {
    engine: TapEngine,
    session: Session,
}

/// State shared with the regeneration task.
struct Shared {
    id: ViewId,
    play: Mutex<Play>,
    updates: broadcast::Sender<ViewState>,
}

impl Shared {
    fn play(&self) -> MutexGuard<'_, Play> {
        self.play.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn project(&self, play: &Play) -> ViewState {
        let engine = &play.engine;
        ViewState {
            view_id: self.id,
            title: engine.rules().title.clone(),
            identity: play.session.identity().cloned(),
            points: engine.points(),
            energy: engine.energy(),
            energy_max: engine.rules().energy_max,
            energy_percent: engine.energy_percent(),
            labels: engine.labels(),
        }
    }

    fn snapshot(&self) -> ViewState {
        let play = self.play();
        self.project(&play)
    }

    fn publish(&self) -> ViewState {
        let state = self.snapshot();
        // No subscribers is fine.
        let _receivers = self.updates.send(state.clone()).unwrap_or(0);
        state
    }
}

/// One open game page.
pub struct GameView {
    shared: Arc<Shared>,
    manager: SessionManager,
    alive: Arc<AtomicBool>,
    closed: watch::Sender<bool>,
    last_active: Mutex<Instant>,
    regen: RegenTimer,
}

impl GameView {
    /// Open an anonymous view and start its regeneration timer.
    ///
    /// The view starts with no points and no energy until someone signs
    /// in. Must be called from within a Tokio runtime.
    pub fn open(rules: GameRules, manager: SessionManager) -> Self {
        let id = ViewId::new();
        let period = rules.regen_interval;
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            id,
            play: Mutex::new(Play {
                engine: TapEngine::restore(rules, 0, 0),
                session: Session::Anonymous,
            }),
            updates,
        });

        let ticking = Arc::clone(&shared);
        let regen = RegenTimer::start(period, move || {
            ticking.play().engine.regenerate();
            ticking.publish();
        });

        tracing::info!(view_id = %id, "View opened");
        Self {
            shared,
            manager,
            alive: Arc::new(AtomicBool::new(true)),
            closed: watch::Sender::new(false),
            last_active: Mutex::new(Instant::now()),
            regen,
        }
    }

    /// This view's id.
    pub fn id(&self) -> ViewId {
        self.shared.id
    }

    /// Tap the coin at `position`.
    ///
    /// An accepted tap on a signed-in view spawns a background write of
    /// the new totals under the identity that was active when they were
    /// computed. Rejected taps change nothing.
    pub fn tap(&self, position: Position) -> TapOutcome {
        self.touch();
        let (outcome, identity) = {
            let mut play = self.shared.play();
            let outcome = play.engine.tap(position);
            (outcome, play.session.identity().cloned())
        };

        match outcome {
            TapOutcome::Accepted { points, energy, .. } => {
                if let Some(identity) = identity {
                    self.manager.persist_in_background(
                        identity,
                        points,
                        energy,
                        Arc::clone(&self.alive),
                    );
                }
                self.shared.publish();
            }
            TapOutcome::Rejected { energy, required } => {
                tracing::debug!(view_id = %self.shared.id, energy, required, "Tap rejected");
            }
        }
        outcome
    }

    /// Remove a finished floating label. Returns whether it was live.
    pub fn expire_event(&self, id: TapEventId) -> bool {
        self.touch();
        let removed = self.shared.play().engine.expire_event(id);
        if removed {
            self.shared.publish();
        }
        removed
    }

    /// Create an account, sign this view in, and load the fresh totals.
    ///
    /// On failure the view keeps its current session and counters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] from the session manager.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<ViewState, SessionError> {
        self.touch();
        let identity = self.manager.sign_up(credentials).await?;
        let starting_energy = self.manager.starting_energy();
        Ok(self.adopt(identity, 0, starting_energy))
    }

    /// Sign this view in and load the stored totals.
    ///
    /// On failure the view keeps its current session and counters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] from the session manager.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<ViewState, SessionError> {
        self.touch();
        let (identity, UserState { points, energy, .. }) =
            self.manager.sign_in(credentials).await?;
        Ok(self.adopt(identity, points, energy))
    }

    /// Switch to `identity` and its totals in one step.
    fn adopt(&self, identity: Identity, points: u64, energy: u32) -> ViewState {
        {
            let mut play = self.shared.play();
            play.engine.load(points, energy);
            play.session = Session::Authenticated(identity);
        }
        self.shared.publish()
    }

    /// Current rendering projection.
    pub fn state(&self) -> ViewState {
        self.shared.snapshot()
    }

    /// Current session.
    pub fn session(&self) -> Session {
        self.shared.play().session.clone()
    }

    /// Receive every future [`ViewState`] of this view.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewState> {
        self.shared.updates.subscribe()
    }

    /// Number of live [`subscribe`](Self::subscribe) receivers.
    pub fn watchers(&self) -> usize {
        self.shared.updates.receiver_count()
    }

    /// A receiver that turns `true` once the view is dismantled.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// Time since the last tap, expiry, or sign-in attempt.
    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Stop regeneration and detach in-flight writes.
    pub fn dismantle(&self) {
        self.alive.store(false, Ordering::Release);
        self.regen.stop();
        self.closed.send_replace(true);
        tracing::info!(view_id = %self.shared.id, "View dismantled");
    }

    /// Whether [`dismantle`](Self::dismantle) has not been called.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Drop for GameView {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tapcoin_db::{AuthBackend, MemoryAccounts, MemoryRecords, RecordStore};
    use tapcoin_types::UserRecord;

    use super::*;

    fn view_with_records() -> (GameView, MemoryRecords) {
        let records = MemoryRecords::new();
        let manager = SessionManager::new(
            AuthBackend::Memory(MemoryAccounts::new()),
            RecordStore::Memory(records.clone()),
            2532,
        );
        (GameView::open(GameRules::default(), manager), records)
    }

    fn creds() -> Credentials {
        Credentials {
            email: "view@tapcoin.test".to_owned(),
            password: "pw".to_owned(),
        }
    }

    const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    #[tokio::test]
    async fn anonymous_view_starts_empty() {
        let (view, _) = view_with_records();
        let state = view.state();
        assert_eq!(state.identity, None);
        assert_eq!((state.points, state.energy), (0, 0));
        assert_eq!(state.title, "Notcoin");
        assert!(!view.tap(ORIGIN).is_accepted());
    }

    #[tokio::test]
    async fn signed_up_view_taps_and_persists() {
        let (view, records) = view_with_records();
        let state = view.sign_up(&creds()).await.unwrap();
        let identity = state.identity.clone().unwrap();
        assert_eq!((state.points, state.energy), (0, 2532));

        assert!(view.tap(ORIGIN).is_accepted());
        let state = view.state();
        assert_eq!((state.points, state.energy), (12, 2520));
        assert_eq!(state.labels.len(), 1);

        // Let the background write land.
        for _ in 0..50 {
            let stored = records.read_record(&identity).await.unwrap().unwrap();
            if stored.points == 12 {
                assert_eq!(stored.energy, Some(2520));
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("background write never landed");
    }

    #[tokio::test]
    async fn persistence_failure_keeps_local_counters() {
        let (view, records) = view_with_records();
        view.sign_up(&creds()).await.unwrap();
        records.set_unavailable(true);

        for _ in 0..3 {
            assert!(view.tap(ORIGIN).is_accepted());
        }
        tokio::task::yield_now().await;
        let state = view.state();
        assert_eq!((state.points, state.energy), (36, 2496));
    }

    #[tokio::test]
    async fn failed_sign_in_leaves_view_anonymous() {
        let (view, _) = view_with_records();
        let err = view.sign_in(&creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(_)));
        assert!(!view.session().is_authenticated());
    }

    #[tokio::test]
    async fn expire_publishes_and_is_idempotent() {
        let (view, _) = view_with_records();
        view.sign_up(&creds()).await.unwrap();
        let TapOutcome::Accepted { event, .. } = view.tap(ORIGIN) else {
            panic!("tap should be accepted");
        };

        let mut updates = view.subscribe();
        assert!(view.expire_event(event.id));
        assert!(!view.expire_event(event.id));

        let frame = updates.recv().await.unwrap();
        assert!(frame.labels.is_empty());
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn regeneration_publishes_until_dismantled() {
        let (view, _) = view_with_records();
        let mut updates = view.subscribe();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let frame = updates.recv().await.unwrap();
        assert_eq!(frame.energy, 1);

        view.dismantle();
        assert!(!view.is_alive());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(view.state().energy, 1);
    }

    #[tokio::test]
    async fn dismantle_wakes_closed_watchers() {
        let (view, _) = view_with_records();
        let mut closed = view.closed();
        assert!(!*closed.borrow());

        view.dismantle();
        assert!(*closed.wait_for(|closed| *closed).await.unwrap());
        // A receiver taken afterwards sees the flag immediately.
        assert!(*view.closed().borrow());
    }

    #[tokio::test]
    async fn watchers_track_subscriptions() {
        let (view, _) = view_with_records();
        assert_eq!(view.watchers(), 0);
        let first = view.subscribe();
        let second = view.subscribe();
        assert_eq!(view.watchers(), 2);
        drop(first);
        drop(second);
        assert_eq!(view.watchers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_idle_time() {
        let (view, _) = view_with_records();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(view.idle_for() >= Duration::from_secs(30));

        view.tap(ORIGIN);
        assert!(view.idle_for() < Duration::from_secs(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn taps_racing_a_sign_in_never_cross_identities() {
        const BOB_POINTS: u64 = 1_000_000;
        let (view, records) = view_with_records();
        let view = Arc::new(view);
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");
        let record = |email: &str, points, energy| UserRecord {
            email: email.to_owned(),
            points,
            energy: Some(energy),
        };
        records
            .create_record(&alice, &record("alice@tapcoin.test", 0, 2532))
            .await
            .unwrap();

        for round in 0..200 {
            records
                .create_record(&bob, &record("bob@tapcoin.test", BOB_POINTS, 0))
                .await
                .unwrap();
            view.adopt(alice.clone(), 0, 2532);

            let tapper = Arc::clone(&view);
            let taps = tokio::task::spawn_blocking(move || {
                for _ in 0..300 {
                    tapper.tap(ORIGIN);
                }
            });
            tokio::task::yield_now().await;
            // Bob has no energy, so every write under bob would be alice's.
            view.adopt(bob.clone(), BOB_POINTS, 0);
            taps.await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;

            let stored = records.read_record(&bob).await.unwrap().unwrap();
            assert_eq!(stored.points, BOB_POINTS, "round {round}");
            assert_eq!(stored.energy, Some(0), "round {round}");
        }
    }
}
