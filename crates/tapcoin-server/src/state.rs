//! Shared application state for the HTTP server.
//!
//! [`AppState`] holds the game rules, the session manager every view
//! talks through, and the [`ViewRegistry`] of open views.
//!
//! Views leave the registry three ways: an explicit `DELETE`, the last
//! `WebSocket` on the view closing, or the idle sweep run by
//! [`spawn_view_reaper`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tapcoin_core::rules::GameRules;
use tapcoin_core::session::SessionManager;
use tapcoin_core::view::GameView;
use tapcoin_types::ViewId;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Open views keyed by id.
#[derive(Default)]
pub struct ViewRegistry {
    views: RwLock<BTreeMap<ViewId, Arc<GameView>>>,
}

impl ViewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view.
    pub async fn insert(&self, view: Arc<GameView>) {
        self.views.write().await.insert(view.id(), view);
    }

    /// Look up a view.
    pub async fn get(&self, id: ViewId) -> Option<Arc<GameView>> {
        self.views.read().await.get(&id).cloned()
    }

    /// Remove a view and dismantle it. Returns whether it existed.
    pub async fn dismantle(&self, id: ViewId) -> bool {
        let removed = self.views.write().await.remove(&id);
        match removed {
            Some(view) => {
                view.dismantle();
                true
            }
            None => false,
        }
    }

    /// Dismantle a view if nobody is subscribed to it any more.
    pub async fn dismantle_if_unwatched(&self, id: ViewId) -> bool {
        let removed = {
            let mut views = self.views.write().await;
            match views.get(&id) {
                Some(view) if view.watchers() == 0 => views.remove(&id),
                _ => None,
            }
        };
        match removed {
            Some(view) => {
                view.dismantle();
                true
            }
            None => false,
        }
    }

    /// Dismantle every unwatched view idle for at least `max_idle`.
    /// Returns how many were removed.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let removed: Vec<Arc<GameView>> = {
            let mut views = self.views.write().await;
            let idle: Vec<ViewId> = views
                .values()
                .filter(|view| view.watchers() == 0 && view.idle_for() >= max_idle)
                .map(|view| view.id())
                .collect();
            idle.iter().filter_map(|id| views.remove(id)).collect()
        };
        for view in &removed {
            view.dismantle();
        }
        removed.len()
    }

    /// Number of open views.
    pub async fn len(&self) -> usize {
        self.views.read().await.len()
    }

    /// Whether no view is open.
    pub async fn is_empty(&self) -> bool {
        self.views.read().await.is_empty()
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Rules every new view plays by.
    pub rules: GameRules,
    /// Collaborator handles shared by all views.
    pub sessions: SessionManager,
    /// Open views.
    pub views: ViewRegistry,
}

impl AppState {
    /// Create application state with no open views.
    pub fn new(rules: GameRules, sessions: SessionManager) -> Self {
        Self {
            rules,
            sessions,
            views: ViewRegistry::new(),
        }
    }

    /// Open a new anonymous view and register it.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn open_view(&self) -> Arc<GameView> {
        let view = Arc::new(GameView::open(self.rules.clone(), self.sessions.clone()));
        self.views.insert(Arc::clone(&view)).await;
        view
    }
}

/// Sweep the registry every `every`, dismantling views nobody watches
/// that have been idle for `max_idle`.
///
/// The first sweep happens one period after the call. `every` must be
/// non-zero. Abort the returned handle to stop sweeping.
pub fn spawn_view_reaper(
    state: Arc<AppState>,
    every: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let first = Instant::now().checked_add(every).unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(first, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reaped = state.views.reap_idle(max_idle).await;
            if reaped > 0 {
                let open = state.views.len().await;
                tracing::info!(reaped, open, "Idle views dismantled");
            }
        }
    })
}
