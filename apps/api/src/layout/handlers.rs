//! Axum route handlers for the Layout API.
//!
//! `POST /api/v1/layout` is a one-shot pass. The `/api/v1/grids` routes keep a
//! `LayoutController` per mounted grid so a front-end can stream resize and
//! item-change signals and read back the debounced result.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::controller::{LayoutController, LayoutSnapshot, ResizeDisposition};
use crate::layout::dimensions::{check_container_width, estimate_container_width};
use crate::layout::engine::{LayoutOutcome, MasonryEngine};
use crate::layout::sessions::GridSession;
use crate::layout::sizing::{
    CardSize, FixedSizePolicy, QuotaSizePolicy, RandomSizePolicy, SizePolicyKind,
};
use crate::models::content::ContentItem;
use crate::state::AppState;

/// Upper bound on how long a snapshot read may block.
const MAX_WAIT_MS: u64 = 30_000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Per-request sizing. Precedence: `footprints`, then `sizePolicy: "quota"`,
/// then `seed` (random), then the configured policy.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOverride {
    /// Explicit per-index footprints.
    pub footprints: Option<Vec<CardSize>>,
    pub size_policy: Option<SizePolicyKind>,
    /// Pins the random policy seed for reproducible output.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    /// Measured container width. Falls back to an estimate from `viewport_width`.
    pub container_width: Option<u32>,
    pub viewport_width: Option<u32>,
    pub items: Vec<ContentItem>,
    /// Forces a column count instead of consulting the breakpoints.
    pub columns: Option<u32>,
    #[serde(flatten)]
    pub policy: PolicyOverride,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResponse {
    pub container_width: u32,
    pub policy: &'static str,
    pub outcome: LayoutOutcome,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountRequest {
    pub container_width: Option<u32>,
    pub viewport_width: Option<u32>,
    pub items: Vec<ContentItem>,
    #[serde(flatten)]
    pub policy: PolicyOverride,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub grid_id: Uuid,
    pub pending_resize: bool,
    pub snapshot: LayoutSnapshot,
}

/// Long-poll parameters for reading a grid snapshot.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    /// Wait for a generation newer than this one.
    pub after: Option<u64>,
    pub wait_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequest {
    pub container_width: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeResponse {
    pub disposition: ResizeDisposition,
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ItemsRequest {
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub changed: bool,
    pub snapshot: LayoutSnapshot,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/layout
///
/// Computes one layout and returns it without keeping any state.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let width = check_container_width(resolve_width(
        request.container_width,
        request.viewport_width,
    ))?;
    let engine = request_engine(&state, request.policy)?;

    let outcome = match request.columns {
        Some(columns) => {
            if width == 0 {
                return Err(AppError::Validation(
                    "containerWidth or viewportWidth is required when forcing columns".to_string(),
                ));
            }
            LayoutOutcome::Masonry(engine.layout_with_columns(&request.items, columns, width)?)
        }
        None => engine.layout(&request.items, width),
    };

    Ok(Json(LayoutResponse {
        container_width: width,
        policy: engine.policy_name(),
        outcome,
    }))
}

/// POST /api/v1/grids
///
/// Mounts a grid session and returns its first snapshot.
pub async fn handle_mount_grid(
    State(state): State<AppState>,
    Json(request): Json<MountRequest>,
) -> Result<(StatusCode, Json<GridResponse>), AppError> {
    let width = check_container_width(resolve_width(
        request.container_width,
        request.viewport_width,
    ))?;
    let engine = request_engine(&state, request.policy)?;

    let controller =
        LayoutController::mount(engine, state.controller_settings, request.items, width);
    let snapshot = controller.snapshot();
    let grid_id = Uuid::new_v4();

    {
        let mut grids = state.grids.write().await;
        if grids.len() >= state.config.grid_max_sessions {
            return Err(AppError::Capacity(format!(
                "{} grid sessions are already mounted",
                grids.len()
            )));
        }
        grids.insert(grid_id, Arc::new(GridSession::new(controller)));
    }
    info!(%grid_id, container_width = width, "Grid mounted");

    Ok((
        StatusCode::CREATED,
        Json(GridResponse {
            grid_id,
            pending_resize: false,
            snapshot,
        }),
    ))
}

/// GET /api/v1/grids/:id?after=<generation>&waitMs=<ms>
///
/// With `after`, blocks until a newer generation is published or the wait
/// expires, then returns whatever is current.
pub async fn handle_get_grid(
    State(state): State<AppState>,
    Path(grid_id): Path<Uuid>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<GridResponse>, AppError> {
    let session = find_grid(&state, grid_id).await?;
    let controller = &session.controller;

    if let Some(after) = query.after {
        let wait = Duration::from_millis(query.wait_ms.unwrap_or(0).min(MAX_WAIT_MS));
        let mut rx = controller.subscribe();
        let newer = async {
            loop {
                let generation = rx.borrow_and_update().generation;
                if generation > after || rx.changed().await.is_err() {
                    break;
                }
            }
        };
        if tokio::time::timeout(wait, newer).await.is_err() {
            debug!(%grid_id, after, "Snapshot wait timed out");
        }
    }

    Ok(Json(GridResponse {
        grid_id,
        pending_resize: controller.has_pending_resize(),
        snapshot: controller.snapshot(),
    }))
}

/// POST /api/v1/grids/:id/resize
///
/// Accepted immediately; the layout updates after the debounce window.
pub async fn handle_resize_grid(
    State(state): State<AppState>,
    Path(grid_id): Path<Uuid>,
    Json(request): Json<ResizeRequest>,
) -> Result<(StatusCode, Json<ResizeResponse>), AppError> {
    let width = check_container_width(request.container_width)?;
    let session = find_grid(&state, grid_id).await?;
    let disposition = session.controller.resize(width);

    Ok((
        StatusCode::ACCEPTED,
        Json(ResizeResponse {
            disposition,
            debounce_ms: state.controller_settings.debounce.as_millis() as u64,
        }),
    ))
}

/// PUT /api/v1/grids/:id/items
///
/// Replaces the item list and returns the recomputed snapshot.
pub async fn handle_set_grid_items(
    State(state): State<AppState>,
    Path(grid_id): Path<Uuid>,
    Json(request): Json<ItemsRequest>,
) -> Result<Json<ItemsResponse>, AppError> {
    let session = find_grid(&state, grid_id).await?;
    let controller = &session.controller;
    let response = match controller.set_items(request.items) {
        Some(snapshot) => ItemsResponse {
            changed: true,
            snapshot,
        },
        None => ItemsResponse {
            changed: false,
            snapshot: controller.snapshot(),
        },
    };
    Ok(Json(response))
}

/// DELETE /api/v1/grids/:id
pub async fn handle_delete_grid(
    State(state): State<AppState>,
    Path(grid_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = state.grids.write().await.remove(&grid_id);
    match removed {
        Some(session) => {
            session.controller.cancel_pending();
            info!(%grid_id, "Grid unmounted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(AppError::NotFound(format!("Grid {grid_id} not found"))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Measured width if known, else an estimate from the viewport, else 0 (not ready).
fn resolve_width(container_width: Option<u32>, viewport_width: Option<u32>) -> u32 {
    container_width
        .or_else(|| viewport_width.map(estimate_container_width))
        .unwrap_or(0)
}

/// The shared engine, or a copy with a request-specific footprint policy.
fn request_engine(state: &AppState, policy: PolicyOverride) -> Result<MasonryEngine, AppError> {
    if let Some(footprints) = policy.footprints {
        let fixed = FixedSizePolicy::new(footprints)?;
        return Ok(state.engine.with_policy(Arc::new(fixed)));
    }

    let config = &state.config;
    let seed = match (policy.size_policy, policy.seed) {
        (Some(SizePolicyKind::Quota), _) => {
            let quota = QuotaSizePolicy::with_wide_category(config.wide_category.clone());
            return Ok(state.engine.with_policy(Arc::new(quota)));
        }
        (_, Some(seed)) => seed,
        (Some(SizePolicyKind::Random), None) if state.engine.policy_name() != "random" => {
            rand::random()
        }
        _ => return Ok(state.engine.clone()),
    };

    let random = RandomSizePolicy::new(seed)
        .with_wide_category(config.wide_category.clone(), config.wide_probability)?;
    Ok(state.engine.with_policy(Arc::new(random)))
}

/// Looks up a session and marks it as used.
async fn find_grid(state: &AppState, grid_id: Uuid) -> Result<Arc<GridSession>, AppError> {
    let session = state
        .grids
        .read()
        .await
        .get(&grid_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Grid {grid_id} not found")))?;
    session.touch();
    Ok(session)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
