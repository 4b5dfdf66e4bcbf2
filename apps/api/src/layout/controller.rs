//! Layout Controller — keeps one grid's layout current as its inputs change.
//!
//! # Triggers
//! - `mount`: computes immediately.
//! - `resize`: debounced. Each call aborts the pending task and schedules a
//!   new one, so a burst of resizes recomputes once with the final width.
//!   Widths within `min_resize_delta` of the last observed width are ignored.
//! - `set_items`: recomputes immediately with the applied width; a list equal
//!   to the current one is a no-op.
//!
//! Every recomputation is a full `MasonryEngine::layout` pass. Results are
//! published as `LayoutSnapshot`s on a watch channel.
//!
//! `resize` spawns onto the current Tokio runtime and must be called from
//! inside one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::layout::engine::{LayoutOutcome, MasonryEngine};
use crate::models::content::ContentItem;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Quiet period a resize must survive before it is applied.
    pub debounce: Duration,
    /// Width changes up to this many pixels are treated as jitter.
    pub min_resize_delta: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_resize_delta: 10,
        }
    }
}

/// One published layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    /// Increments on every recomputation, starting at 1 for the mount.
    pub generation: u64,
    pub container_width: u32,
    pub item_count: usize,
    pub computed_at: DateTime<Utc>,
    pub outcome: LayoutOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeDisposition {
    /// Within the jitter threshold; nothing scheduled.
    Ignored,
    /// A recomputation is pending for this width.
    Scheduled,
}

struct ControllerState {
    items: Vec<ContentItem>,
    /// Width the current snapshot was computed with.
    applied_width: u32,
    /// Last width accepted by `resize`, applied or not.
    observed_width: u32,
    generation: u64,
    /// Identifies the newest scheduled resize; older tasks see a mismatch and exit.
    resize_token: u64,
    pending: Option<JoinHandle<()>>,
}

struct Shared {
    engine: MasonryEngine,
    state: Mutex<ControllerState>,
    tx: watch::Sender<LayoutSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs a full pass and publishes it. Caller holds the state lock.
    fn recompute(&self, state: &mut ControllerState) -> LayoutSnapshot {
        state.generation += 1;
        let snapshot = build_snapshot(&self.engine, state);
        self.tx.send_replace(snapshot.clone());
        snapshot
    }

    fn apply_resize(&self, width: u32, token: u64) {
        let mut state = self.lock();
        if state.resize_token != token {
            return;
        }
        state.pending = None;
        state.applied_width = width;
        let snapshot = self.recompute(&mut state);
        info!(
            generation = snapshot.generation,
            container_width = width,
            "Applied debounced resize"
        );
    }
}

fn build_snapshot(engine: &MasonryEngine, state: &ControllerState) -> LayoutSnapshot {
    LayoutSnapshot {
        generation: state.generation,
        container_width: state.applied_width,
        item_count: state.items.len(),
        computed_at: Utc::now(),
        outcome: engine.layout(&state.items, state.applied_width),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

pub struct LayoutController {
    shared: Arc<Shared>,
    settings: ControllerSettings,
}

impl LayoutController {
    /// Computes the initial layout and starts publishing.
    pub fn mount(
        engine: MasonryEngine,
        settings: ControllerSettings,
        items: Vec<ContentItem>,
        container_width: u32,
    ) -> Self {
        let state = ControllerState {
            items,
            applied_width: container_width,
            observed_width: container_width,
            generation: 1,
            resize_token: 0,
            pending: None,
        };
        let initial = build_snapshot(&engine, &state);
        let (tx, _rx) = watch::channel(initial);

        debug!(
            container_width,
            items = state.items.len(),
            "Layout controller mounted"
        );

        Self {
            shared: Arc::new(Shared {
                engine,
                state: Mutex::new(state),
                tx,
            }),
            settings,
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LayoutSnapshot> {
        self.shared.tx.subscribe()
    }

    pub fn has_pending_resize(&self) -> bool {
        self.shared.lock().pending.is_some()
    }

    /// Schedules a recomputation for `container_width` after the debounce window.
    pub fn resize(&self, container_width: u32) -> ResizeDisposition {
        let mut state = self.shared.lock();

        if container_width.abs_diff(state.observed_width) <= self.settings.min_resize_delta {
            debug!(
                container_width,
                observed = state.observed_width,
                "Ignoring resize within jitter threshold"
            );
            return ResizeDisposition::Ignored;
        }

        state.observed_width = container_width;
        state.resize_token += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        let token = state.resize_token;
        let delay = self.settings.debounce;
        let shared = Arc::clone(&self.shared);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.apply_resize(container_width, token);
        }));

        ResizeDisposition::Scheduled
    }

    /// Replaces the item list and recomputes at once.
    ///
    /// Returns `None` when the list is unchanged.
    pub fn set_items(&self, items: Vec<ContentItem>) -> Option<LayoutSnapshot> {
        let mut state = self.shared.lock();
        if state.items == items {
            debug!(items = items.len(), "Item list unchanged; keeping layout");
            return None;
        }
        state.items = items;
        Some(self.shared.recompute(&mut state))
    }

    /// Drops any scheduled resize without applying it.
    ///
    /// The jitter baseline falls back to the applied width, so a later resize
    /// to the cancelled width is scheduled again.
    pub fn cancel_pending(&self) {
        let mut state = self.shared.lock();
        state.observed_width = state.applied_width;
        state.resize_token += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for LayoutController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
