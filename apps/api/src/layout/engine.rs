//! Masonry Layout Engine — one complete, stateless layout pass.
//!
//! `MasonryEngine::layout` resolves the grid for a container width, assigns
//! footprints, places every item in input order on a fresh `OccupancyGrid`
//! and derives the container height. Nothing survives between passes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::dimensions::{resolve_grid, GridConfig, GridDimensions, GridResolution};
use crate::layout::error::LayoutError;
use crate::layout::occupancy::OccupancyGrid;
use crate::layout::placement::{CardPlacement, PlacementSearch, ScoringWeights, SearchLimits};
use crate::layout::sizing::{CardSize, SizeAssignor, SizePolicy};
use crate::models::content::ContentItem;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub weights: ScoringWeights,
    pub limits: SearchLimits,
    /// One hero per this many items, granted to featured items in order.
    pub featured_divisor: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            weights: ScoringWeights::default(),
            limits: SearchLimits::default(),
            featured_divisor: 8,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.limits.validate()?;
        if self.featured_divisor == 0 {
            return Err(LayoutError::InvalidPolicy(
                "featured_divisor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Placements for a multi-column grid, index-aligned with the input items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasonryLayout {
    pub dimensions: GridDimensions,
    pub placements: Vec<CardPlacement>,
    pub container_height: u64,
}

impl MasonryLayout {
    pub fn degraded_count(&self) -> usize {
        self.placements.iter().filter(|p| p.degraded).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum LayoutOutcome {
    /// Container width unknown or too small; the host should wait.
    NotReady,
    /// One column: the host renders items in plain document flow.
    SingleColumn {
        #[serde(rename = "itemCount")]
        item_count: usize,
    },
    Masonry(MasonryLayout),
}

#[cfg(test)]
impl LayoutOutcome {
    pub fn masonry(&self) -> Option<&MasonryLayout> {
        match self {
            LayoutOutcome::Masonry(layout) => Some(layout),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Immutable engine: configuration plus the footprint policy.
///
/// Cheap to clone; every call to `layout` builds its own occupancy grid.
#[derive(Clone)]
pub struct MasonryEngine {
    config: EngineConfig,
    policy: Arc<dyn SizePolicy>,
}

impl std::fmt::Debug for MasonryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasonryEngine")
            .field("config", &self.config)
            .field("policy", &self.policy.name())
            .finish()
    }
}

impl MasonryEngine {
    pub fn new(config: EngineConfig, policy: Arc<dyn SizePolicy>) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self { config, policy })
    }

    /// Same configuration, different footprint policy.
    pub fn with_policy(&self, policy: Arc<dyn SizePolicy>) -> Self {
        Self {
            config: self.config.clone(),
            policy,
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Full layout for a measured container width.
    pub fn layout(&self, items: &[ContentItem], container_width: u32) -> LayoutOutcome {
        match resolve_grid(container_width, &self.config.grid) {
            GridResolution::NotReady => {
                debug!(container_width, "Container not measured; deferring layout");
                LayoutOutcome::NotReady
            }
            GridResolution::SingleColumn => LayoutOutcome::SingleColumn {
                item_count: items.len(),
            },
            GridResolution::Masonry(dims) => LayoutOutcome::Masonry(self.layout_in(items, dims)),
        }
    }

    /// Layout with an explicit column count, bypassing the breakpoint table.
    ///
    /// Used when the host forces masonry even where the breakpoints would not,
    /// including the single-column case.
    pub fn layout_with_columns(
        &self,
        items: &[ContentItem],
        columns: u32,
        container_width: u32,
    ) -> Result<MasonryLayout, LayoutError> {
        let padding = self.config.grid.padding_for(columns);
        let dims = GridDimensions::new(columns, container_width, padding)?;
        Ok(self.layout_in(items, dims))
    }

    fn layout_in(&self, items: &[ContentItem], dims: GridDimensions) -> MasonryLayout {
        let sizes = SizeAssignor::new(self.policy.as_ref(), self.config.featured_divisor)
            .assign_all(items, dims.columns);
        let search = PlacementSearch::new(self.config.weights, self.config.limits);
        let layout = pack(&sizes, dims, &search);

        debug!(
            items = items.len(),
            columns = dims.columns,
            container_height = layout.container_height,
            degraded = layout.degraded_count(),
            policy = self.policy.name(),
            "Masonry layout computed"
        );
        layout
    }
}

/// Places pre-assigned footprints in order on a fresh grid.
pub fn pack(sizes: &[CardSize], dims: GridDimensions, search: &PlacementSearch) -> MasonryLayout {
    let mut grid = OccupancyGrid::new(dims.columns);
    let placements: Vec<CardPlacement> = sizes
        .iter()
        .map(|size| search.place(&mut grid, *size, &dims))
        .collect();

    let rows = placements
        .iter()
        .map(CardPlacement::bottom_row)
        .max()
        .unwrap_or(0);

    MasonryLayout {
        dimensions: dims,
        placements,
        container_height: u64::from(rows) * u64::from(dims.cell_height),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::sizing::{FixedSizePolicy, RandomSizePolicy, UniformSizePolicy};
    use proptest::prelude::*;

    /// 1216px → 3 columns of 400 × 225.
    const DESKTOP: u32 = 1216;

    fn items(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| ContentItem::article(format!("news-{i}"), "clubNews"))
            .collect()
    }

    fn engine(weights: ScoringWeights, policy: Arc<dyn SizePolicy>) -> MasonryEngine {
        let config = EngineConfig {
            weights,
            ..EngineConfig::default()
        };
        MasonryEngine::new(config, policy).unwrap()
    }

    fn fixed(sizes: Vec<CardSize>) -> Arc<dyn SizePolicy> {
        Arc::new(FixedSizePolicy::new(sizes).unwrap())
    }

    fn positions(layout: &MasonryLayout) -> Vec<(u32, u32)> {
        layout
            .placements
            .iter()
            .map(|p| (p.grid_x, p.grid_y))
            .collect()
    }

    fn masonry(outcome: LayoutOutcome) -> MasonryLayout {
        match outcome {
            LayoutOutcome::Masonry(layout) => layout,
            other => panic!("expected masonry layout, got {other:?}"),
        }
    }

    // ── outcomes ────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_items_give_empty_layout() {
        let e = engine(
            ScoringWeights::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        let layout = masonry(e.layout(&[], DESKTOP));
        assert!(layout.placements.is_empty());
        assert_eq!(layout.container_height, 0);
    }

    #[test]
    fn test_zero_width_is_not_ready() {
        let e = engine(
            ScoringWeights::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        assert_eq!(e.layout(&items(3), 0), LayoutOutcome::NotReady);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            featured_divisor: 0,
            ..EngineConfig::default()
        };
        assert!(MasonryEngine::new(config, Arc::new(UniformSizePolicy(CardSize::STANDARD))).is_err());
    }

    // ── scenario A: seven standard tiles ────────────────────────────────────

    #[test]
    fn test_standard_tiles_in_reading_order() {
        let e = engine(
            ScoringWeights::reading_order(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        let layout = masonry(e.layout(&items(7), DESKTOP));
        assert_eq!(
            positions(&layout),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1), (0, 2)]
        );
        assert_eq!(layout.container_height, 3 * 225);
    }

    #[test]
    fn test_standard_tiles_with_default_weights_avoid_stranded_cells() {
        // The right-edge bonus and gap penalty pull the second tile of each
        // row to the right edge before the middle column is filled.
        let e = engine(
            ScoringWeights::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        let layout = masonry(e.layout(&items(7), DESKTOP));
        assert_eq!(
            positions(&layout),
            vec![(0, 0), (2, 0), (1, 0), (0, 1), (2, 1), (1, 1), (0, 2)]
        );
        assert_eq!(layout.container_height, 3 * 225);
    }

    // ── scenario B: mixed footprints ────────────────────────────────────────

    fn scenario_b_sizes() -> Vec<CardSize> {
        vec![
            CardSize::WIDE,
            CardSize::STANDARD,
            CardSize::STANDARD,
            CardSize::TALL,
            CardSize::STANDARD,
        ]
    }

    #[test]
    fn test_mixed_footprints_in_reading_order() {
        let e = engine(ScoringWeights::reading_order(), fixed(scenario_b_sizes()));
        let layout = masonry(e.layout(&items(5), DESKTOP));
        assert_eq!(
            positions(&layout),
            vec![(0, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
        // The tall tile spans rows 1–2.
        assert_eq!(layout.placements[3].size(), CardSize::TALL);
        assert_eq!(layout.container_height, 3 * 225);
    }

    #[test]
    fn test_mixed_footprints_with_default_weights() {
        let e = engine(ScoringWeights::default(), fixed(scenario_b_sizes()));
        let layout = masonry(e.layout(&items(5), DESKTOP));
        assert_eq!(
            positions(&layout),
            vec![(0, 0), (2, 0), (0, 1), (2, 1), (1, 1)]
        );
        assert_eq!(layout.container_height, 3 * 225);
    }

    // ── scenario C: single column ───────────────────────────────────────────

    #[test]
    fn test_single_column_bypasses_masonry() {
        let e = engine(ScoringWeights::default(), fixed(vec![CardSize::HERO]));
        assert_eq!(
            e.layout(&items(1), 600),
            LayoutOutcome::SingleColumn { item_count: 1 }
        );
    }

    #[test]
    fn test_forced_single_column_clamps_hero() {
        let e = engine(ScoringWeights::default(), fixed(vec![CardSize::HERO]));
        let layout = e.layout_with_columns(&items(1), 1, 600).unwrap();
        assert_eq!(layout.placements[0].size(), CardSize::TALL);
        assert_eq!(positions(&layout), vec![(0, 0)]);
        // (600 - 16) = 584 wide; 584 * 9 / 16 = 328 tall
        assert_eq!(layout.container_height, 2 * 328);
    }

    #[test]
    fn test_forced_columns_reject_zero() {
        let e = engine(ScoringWeights::default(), fixed(vec![]));
        assert_eq!(
            e.layout_with_columns(&items(1), 0, 600).unwrap_err(),
            LayoutError::ZeroColumns
        );
    }

    // ── featured items ──────────────────────────────────────────────────────

    #[test]
    fn test_featured_item_becomes_hero() {
        let mut list = items(8);
        list[0].is_featured = true;
        let e = engine(
            ScoringWeights::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        let layout = masonry(e.layout(&list, DESKTOP));
        assert_eq!(layout.placements[0].size(), CardSize::HERO);
        assert_eq!(layout.placements[0].pixel_width, 800);
        assert_eq!(layout.placements[0].pixel_height, 450);
    }

    #[test]
    fn test_pixel_coordinates_follow_cells() {
        let e = engine(
            ScoringWeights::reading_order(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        let layout = masonry(e.layout(&items(5), DESKTOP));
        let p = layout.placements[4];
        assert_eq!((p.grid_x, p.grid_y), (1, 1));
        assert_eq!((p.pixel_x, p.pixel_y), (400, 225));
    }

    #[test]
    fn test_oversized_width_defers_instead_of_overflowing() {
        let e = engine(
            ScoringWeights::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        assert_eq!(e.layout(&items(1), 4_000_000_000), LayoutOutcome::NotReady);
        assert!(matches!(
            e.layout_with_columns(&items(1), 3, u32::MAX),
            Err(LayoutError::ContainerTooWide { .. })
        ));
    }

    #[test]
    fn test_forced_columns_are_capped() {
        let e = engine(
            ScoringWeights::default(),
            Arc::new(UniformSizePolicy(CardSize::STANDARD)),
        );
        assert!(matches!(
            e.layout_with_columns(&items(1), 1_000_000_000, 100_000),
            Err(LayoutError::TooManyColumns { .. })
        ));
    }

    #[test]
    fn test_deep_grid_pixels_do_not_overflow() {
        let dims = GridDimensions::new(2, 100_000, 16).unwrap();
        let sizes = vec![CardSize::HERO; 80_000];
        let layout = pack(&sizes, dims, &PlacementSearch::default());
        let last = layout.placements[79_999];
        assert_eq!(last.grid_y, 159_998);
        assert_eq!(last.pixel_y, 159_998 * u64::from(dims.cell_height));
        assert!(layout.container_height > u64::from(u32::MAX));
    }

    #[test]
    fn test_outcome_serializes_with_mode_tag() {
        let value = serde_json::to_value(LayoutOutcome::SingleColumn { item_count: 4 }).unwrap();
        assert_eq!(value["mode"], "singleColumn");
        assert_eq!(value["itemCount"], 4);
    }

    // ── invariants ──────────────────────────────────────────────────────────

    fn assert_invariants(layout: &MasonryLayout, item_count: usize) {
        let columns = layout.dimensions.columns;
        assert_eq!(layout.placements.len(), item_count, "coverage");

        for p in &layout.placements {
            assert!(p.grid_x + p.width <= columns, "bounds: {p:?}");
        }

        for (i, a) in layout.placements.iter().enumerate() {
            for b in &layout.placements[i + 1..] {
                assert!(!a.overlaps(b), "overlap: {a:?} vs {b:?}");
            }
        }

        let rows = layout
            .placements
            .iter()
            .map(|p| p.grid_y + p.height)
            .max()
            .unwrap_or(0);
        assert_eq!(
            layout.container_height,
            u64::from(rows) * u64::from(layout.dimensions.cell_height),
            "height consistency"
        );
    }

    fn footprint() -> impl Strategy<Value = CardSize> {
        (1u32..=2, 1u32..=2).prop_map(|(w, h)| CardSize::new(w, h))
    }

    proptest! {
        #[test]
        fn fixed_footprints_hold_invariants(
            sizes in proptest::collection::vec(footprint(), 0..80),
            featured in proptest::collection::vec(any::<bool>(), 80),
            columns in 1u32..=5,
        ) {
            let list: Vec<ContentItem> = items(sizes.len())
                .into_iter()
                .zip(featured.iter())
                .map(|(mut item, f)| { item.is_featured = *f; item })
                .collect();
            let e = engine(ScoringWeights::default(), fixed(sizes));

            let first = e.layout_with_columns(&list, columns, 1600).unwrap();
            assert_invariants(&first, list.len());

            let second = e.layout_with_columns(&list, columns, 1600).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn random_policy_holds_invariants(
            seed in any::<u64>(),
            count in 0usize..120,
            width in 768u32..2400,
        ) {
            let e = engine(ScoringWeights::default(), Arc::new(RandomSizePolicy::new(seed)));
            let list = items(count);
            let first = e.layout(&list, width);
            if let LayoutOutcome::Masonry(layout) = &first {
                assert_invariants(layout, count);
            }
            prop_assert_eq!(first, e.layout(&list, width));
        }
    }
}
