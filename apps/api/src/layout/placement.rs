//! Placement Search — picks a free position for one footprint and commits it.
//!
//! # Algorithm
//! 1. Scan `(x, y)` row-major from the first row with a free cell, at most
//!    `max_scan_rows` rows deep.
//! 2. The first row holding any valid candidate is `min_y`. Scanning continues
//!    for `lookahead_rows` further rows, then stops.
//! 3. Candidates on `min_y` are scored with `ScoringWeights`; the highest score
//!    wins and ties go to the smallest `x`.
//!
//! When the window holds no valid candidate the item is degraded to a 1×1
//! footprint on the first free cell and flagged, never dropped.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layout::dimensions::GridDimensions;
use crate::layout::error::LayoutError;
use crate::layout::occupancy::OccupancyGrid;
use crate::layout::sizing::CardSize;

// ────────────────────────────────────────────────────────────────────────────
// Tunables
// ────────────────────────────────────────────────────────────────────────────

/// Score contributions used to rank candidates on the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Placement fills the rest of its row.
    pub row_completion: i64,
    /// Subtracted once per column of `x`, keeping reading order.
    pub left_bias_per_column: i64,
    pub left_edge_bonus: i64,
    pub right_edge_bonus: i64,
    /// Placement would strand a single free column beside it.
    pub isolated_gap_penalty: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            row_completion: 200,
            left_bias_per_column: 10,
            left_edge_bonus: 30,
            right_edge_bonus: 30,
            isolated_gap_penalty: 100,
        }
    }
}

impl ScoringWeights {
    /// Row completion and left bias only: candidates fill strictly left to right.
    pub fn reading_order() -> Self {
        Self {
            left_edge_bonus: 0,
            right_edge_bonus: 0,
            isolated_gap_penalty: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Safety ceiling on rows scanned per item.
    pub max_scan_rows: u32,
    /// Rows still scanned after the first row with a valid candidate.
    pub lookahead_rows: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_scan_rows: 100,
            lookahead_rows: 2,
        }
    }
}

impl SearchLimits {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.max_scan_rows == 0 {
            return Err(LayoutError::InvalidLimits(
                "max_scan_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
}

/// Final position of one item in both grid cells and pixels.
///
/// Pixel fields are `u64` so deep grids cannot overflow `rows × cell_height`.
///
/// `degraded` is set when the search window held no slot for the assigned
/// footprint and the item was shrunk to 1×1 to keep it on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub grid_x: u32,
    pub grid_y: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_x: u64,
    pub pixel_y: u64,
    pub pixel_width: u64,
    pub pixel_height: u64,
    pub degraded: bool,
}

impl CardPlacement {
    pub fn new(
        position: GridPosition,
        size: CardSize,
        dims: &GridDimensions,
        degraded: bool,
    ) -> Self {
        Self {
            grid_x: position.x,
            grid_y: position.y,
            width: size.width,
            height: size.height,
            pixel_x: u64::from(position.x) * u64::from(dims.cell_width),
            pixel_y: u64::from(position.y) * u64::from(dims.cell_height),
            pixel_width: u64::from(size.width) * u64::from(dims.cell_width),
            pixel_height: u64::from(size.height) * u64::from(dims.cell_height),
            degraded,
        }
    }

    #[cfg(test)]
    pub fn size(&self) -> CardSize {
        CardSize::new(self.width, self.height)
    }

    /// Row just below this placement.
    pub fn bottom_row(&self) -> u32 {
        self.grid_y + self.height
    }

    #[cfg(test)]
    pub fn overlaps(&self, other: &CardPlacement) -> bool {
        self.grid_x < other.grid_x + other.width
            && other.grid_x < self.grid_x + self.width
            && self.grid_y < other.grid_y + other.height
            && other.grid_y < self.grid_y + self.height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Spans the full row from `x = 0`, or closes the row off with everything to
/// its left already claimed.
pub fn completes_row(grid: &OccupancyGrid, x: u32, y: u32, width: u32) -> bool {
    let columns = grid.columns();
    if x == 0 && width == columns {
        return true;
    }
    x + width == columns && grid.row_filled_before(x, y)
}

/// A free single cell at column 0 beside `x = 1`, or exactly one column left
/// over on the right.
pub fn leaves_isolated_gap(grid: &OccupancyGrid, x: u32, y: u32, width: u32) -> bool {
    if x == 1 && !grid.is_occupied(0, y) {
        return true;
    }
    let right = x + width;
    right < grid.columns() && grid.columns() - right == 1
}

pub fn score_position(
    grid: &OccupancyGrid,
    x: u32,
    y: u32,
    size: CardSize,
    weights: &ScoringWeights,
) -> i64 {
    let mut score = 0i64;

    if completes_row(grid, x, y, size.width) {
        score += weights.row_completion;
    }

    score -= i64::from(x) * weights.left_bias_per_column;

    if x == 0 {
        score += weights.left_edge_bonus;
    }
    if x + size.width == grid.columns() {
        score += weights.right_edge_bonus;
    }

    if leaves_isolated_gap(grid, x, y, size.width) {
        score -= weights.isolated_gap_penalty;
    }

    score
}

// ────────────────────────────────────────────────────────────────────────────
// Search
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementSearch {
    pub weights: ScoringWeights,
    pub limits: SearchLimits,
}

impl PlacementSearch {
    pub fn new(weights: ScoringWeights, limits: SearchLimits) -> Self {
        Self { weights, limits }
    }

    /// Best position for `size` inside the scan window, if any.
    pub fn find_position(&self, grid: &OccupancyGrid, size: CardSize) -> Option<GridPosition> {
        let max_x = grid.columns().checked_sub(size.width)?;
        let start = grid.first_open_row();
        let end = start.saturating_add(self.limits.max_scan_rows);

        let mut best: Option<(GridPosition, i64)> = None;

        for y in start..end {
            if let Some((pos, _)) = best {
                if y > pos.y + self.limits.lookahead_rows {
                    break;
                }
            }

            for x in 0..=max_x {
                if !grid.can_place(x, y, size) {
                    continue;
                }
                let score = score_position(grid, x, y, size, &self.weights);
                match best {
                    None => best = Some((GridPosition { x, y }, score)),
                    Some((pos, best_score)) if y == pos.y && score > best_score => {
                        best = Some((GridPosition { x, y }, score));
                    }
                    _ => {}
                }
            }
        }

        best.map(|(pos, _)| pos)
    }

    /// Finds, commits and returns the placement for one item.
    pub fn place(
        &self,
        grid: &mut OccupancyGrid,
        size: CardSize,
        dims: &GridDimensions,
    ) -> CardPlacement {
        if let Some(position) = self.find_position(grid, size) {
            grid.mark_occupied(position.x, position.y, size);
            return CardPlacement::new(position, size, dims, false);
        }

        let (x, y) = grid.first_free_cell();
        warn!(
            width = size.width,
            height = size.height,
            max_scan_rows = self.limits.max_scan_rows,
            fallback_x = x,
            fallback_y = y,
            "No slot within scan window; degrading item to 1x1"
        );
        grid.mark_occupied(x, y, CardSize::STANDARD);
        CardPlacement::new(GridPosition { x, y }, CardSize::STANDARD, dims, true)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
