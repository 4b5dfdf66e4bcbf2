//! Grid session registry: mounted controllers keyed by grid id.
//!
//! Every handler access refreshes a session's last-seen time. A background
//! reaper drops sessions idle past the configured TTL. Dropping a session
//! drops its controller, which cancels any pending resize.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::layout::controller::LayoutController;

/// Shortest reaper period regardless of TTL.
const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

pub struct GridSession {
    pub controller: LayoutController,
    last_seen: Mutex<Instant>,
}

impl GridSession {
    pub fn new(controller: LayoutController) -> Self {
        Self {
            controller,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self
            .last_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self
            .last_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        now.saturating_duration_since(last_seen)
    }
}

pub type GridRegistry = Arc<RwLock<HashMap<Uuid, Arc<GridSession>>>>;

/// Removes sessions idle for at least `ttl`; returns how many were removed.
pub async fn evict_idle(grids: &GridRegistry, ttl: Duration) -> usize {
    let now = Instant::now();
    let mut grids = grids.write().await;
    let before = grids.len();
    grids.retain(|_, session| session.idle_for(now) < ttl);
    before - grids.len()
}

/// Sweeps the registry every quarter TTL for as long as the task lives.
pub fn spawn_reaper(grids: GridRegistry, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 4).max(MIN_SWEEP_PERIOD);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = evict_idle(&grids, ttl).await;
            if evicted > 0 {
                info!(evicted, ttl_secs = ttl.as_secs(), "Evicted idle grid sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::controller::ControllerSettings;
    use crate::layout::engine::{EngineConfig, MasonryEngine};
    use crate::layout::sizing::{CardSize, UniformSizePolicy};
    use crate::models::content::ContentItem;

    fn session() -> Arc<GridSession> {
        let engine = MasonryEngine::new(
            EngineConfig::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        )
        .unwrap();
        let items = vec![ContentItem::article("a", "clubNews")];
        Arc::new(GridSession::new(LayoutController::mount(
            engine,
            ControllerSettings::default(),
            items,
            1216,
        )))
    }

    async fn registry_with(ids: &[Uuid]) -> (GridRegistry, Vec<Arc<GridSession>>) {
        let grids: GridRegistry = Arc::default();
        let mut sessions = Vec::new();
        for id in ids {
            let s = session();
            grids.write().await.insert(*id, Arc::clone(&s));
            sessions.push(s);
        }
        (grids, sessions)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted() {
        let (stale, fresh) = (Uuid::new_v4(), Uuid::new_v4());
        let (grids, sessions) = registry_with(&[stale, fresh]).await;

        tokio::time::advance(Duration::from_secs(50)).await;
        sessions[1].touch();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(evict_idle(&grids, Duration::from_secs(60)).await, 1);
        let grids = grids.read().await;
        assert!(!grids.contains_key(&stale));
        assert!(grids.contains_key(&fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_sweeps_in_background() {
        let id = Uuid::new_v4();
        let (grids, sessions) = registry_with(&[id]).await;
        drop(sessions);

        let reaper = spawn_reaper(Arc::clone(&grids), Duration::from_secs(8));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(grids.read().await.is_empty());
        reaper.abort();
    }
}
