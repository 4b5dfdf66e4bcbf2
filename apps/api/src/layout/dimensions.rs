//! Grid Dimension Calculator — column count and cell size for a container width.
//!
//! Columns come from a responsive breakpoint table; the cell width is the
//! padded container width split evenly across columns and the cell height
//! follows a fixed 16:9 aspect ratio.

use serde::{Deserialize, Serialize};

use crate::layout::error::LayoutError;

/// Cell height = floor(cell width × 9 / 16).
const ASPECT_NUM: u32 = 9;
const ASPECT_DEN: u32 = 16;

/// Horizontal gutter assumed around the grid when only the viewport is known.
const VIEWPORT_GUTTER_PX: u32 = 32;
/// Widest container the page layout ever hands to the grid.
const MAX_CONTAINER_PX: u32 = 1536;

/// Hard ceilings on accepted input. Keeps every pixel product inside `u32`
/// and bounds the per-row occupancy allocation.
pub const MAX_CONTAINER_WIDTH_PX: u32 = 100_000;
pub const MAX_COLUMNS: u32 = 12;

// ────────────────────────────────────────────────────────────────────────────
// Breakpoints
// ────────────────────────────────────────────────────────────────────────────

/// Widths strictly below `below` get `columns` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointTier {
    pub below: u32,
    pub columns: u32,
}

/// Responsive column policy: ascending tiers plus the column count used above
/// the last tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    tiers: Vec<BreakpointTier>,
    max_columns: u32,
}

impl Breakpoints {
    pub fn new(tiers: Vec<BreakpointTier>, max_columns: u32) -> Result<Self, LayoutError> {
        if max_columns == 0 || tiers.iter().any(|t| t.columns == 0) {
            return Err(LayoutError::ZeroColumns);
        }
        if let Some(columns) = tiers
            .iter()
            .map(|t| t.columns)
            .chain(std::iter::once(max_columns))
            .find(|&c| c > MAX_COLUMNS)
        {
            return Err(LayoutError::TooManyColumns {
                columns,
                max: MAX_COLUMNS,
            });
        }
        if tiers.windows(2).any(|w| w[0].below >= w[1].below) {
            return Err(LayoutError::InvalidBreakpoints(
                "tier widths must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { tiers, max_columns })
    }

    pub fn columns_for(&self, width: u32) -> u32 {
        self.tiers
            .iter()
            .find(|t| width < t.below)
            .map(|t| t.columns)
            .unwrap_or(self.max_columns)
    }

    pub fn max_columns(&self) -> u32 {
        self.max_columns
    }
}

impl Default for Breakpoints {
    /// Mobile below 768px, tablet below 1024px, three columns on desktop.
    fn default() -> Self {
        Self {
            tiers: vec![
                BreakpointTier {
                    below: 768,
                    columns: 1,
                },
                BreakpointTier {
                    below: 1024,
                    columns: 2,
                },
            ],
            max_columns: 3,
        }
    }
}

/// Parses a `below:columns` list such as `"768:1,1024:2"`.
pub fn parse_breakpoint_tiers(raw: &str) -> Result<Vec<BreakpointTier>, LayoutError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (below, columns) = pair.split_once(':').ok_or_else(|| {
                LayoutError::InvalidBreakpoints(format!("'{pair}' is not of the form width:columns"))
            })?;
            let below = below.trim().parse::<u32>().map_err(|_| {
                LayoutError::InvalidBreakpoints(format!("'{below}' is not a pixel width"))
            })?;
            let columns = columns.trim().parse::<u32>().map_err(|_| {
                LayoutError::InvalidBreakpoints(format!("'{columns}' is not a column count"))
            })?;
            Ok(BreakpointTier { below, columns })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Grid configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub breakpoints: Breakpoints,
    /// Subtracted once from the container width before dividing into columns.
    pub padding: u32,
    /// Tighter padding used once the grid reaches `dense_from_columns`.
    pub dense_padding: u32,
    pub dense_from_columns: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            breakpoints: Breakpoints::default(),
            padding: 16,
            dense_padding: 12,
            dense_from_columns: 4,
        }
    }
}

impl GridConfig {
    pub fn padding_for(&self, columns: u32) -> u32 {
        if columns >= self.dense_from_columns {
            self.dense_padding
        } else {
            self.padding
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dimensions
// ────────────────────────────────────────────────────────────────────────────

/// Pixel geometry of one virtual grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDimensions {
    pub columns: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridDimensions {
    /// Builds the geometry for an explicit column count.
    ///
    /// Fails when the padded width cannot give every column at least one pixel,
    /// or when the width or column count is past its ceiling.
    pub fn new(columns: u32, container_width: u32, padding: u32) -> Result<Self, LayoutError> {
        if columns == 0 {
            return Err(LayoutError::ZeroColumns);
        }
        if columns > MAX_COLUMNS {
            return Err(LayoutError::TooManyColumns {
                columns,
                max: MAX_COLUMNS,
            });
        }
        check_container_width(container_width)?;
        let cell_width = container_width.saturating_sub(padding) / columns;
        let cell_height = cell_width * ASPECT_NUM / ASPECT_DEN;
        if cell_width == 0 || cell_height == 0 {
            return Err(LayoutError::ContainerTooNarrow {
                container_width,
                columns,
            });
        }
        Ok(Self {
            columns,
            cell_width,
            cell_height,
        })
    }
}

/// Rejects widths past `MAX_CONTAINER_WIDTH_PX`.
pub fn check_container_width(container_width: u32) -> Result<u32, LayoutError> {
    if container_width > MAX_CONTAINER_WIDTH_PX {
        return Err(LayoutError::ContainerTooWide {
            container_width,
            max: MAX_CONTAINER_WIDTH_PX,
        });
    }
    Ok(container_width)
}

/// What the host should do with a given container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridResolution {
    /// Width unmeasured, too small or past the ceiling; defer layout.
    NotReady,
    /// One column: masonry adds nothing, fall back to plain flow.
    SingleColumn,
    Masonry(GridDimensions),
}

pub fn resolve_grid(container_width: u32, config: &GridConfig) -> GridResolution {
    if container_width == 0 {
        return GridResolution::NotReady;
    }
    let columns = config.breakpoints.columns_for(container_width);
    if columns == 1 {
        return GridResolution::SingleColumn;
    }
    match GridDimensions::new(columns, container_width, config.padding_for(columns)) {
        Ok(dims) => GridResolution::Masonry(dims),
        Err(_) => GridResolution::NotReady,
    }
}

/// Best guess at the container width before the host has measured it.
pub fn estimate_container_width(viewport_width: u32) -> u32 {
    viewport_width
        .saturating_sub(VIEWPORT_GUTTER_PX)
        .min(MAX_CONTAINER_PX)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── breakpoints ─────────────────────────────────────────────────────────

    #[test]
    fn test_default_breakpoints() {
        let bp = Breakpoints::default();
        assert_eq!(bp.columns_for(320), 1);
        assert_eq!(bp.columns_for(767), 1);
        assert_eq!(bp.columns_for(768), 2);
        assert_eq!(bp.columns_for(1023), 2);
        assert_eq!(bp.columns_for(1024), 3);
        assert_eq!(bp.columns_for(4000), 3);
    }

    #[test]
    fn test_breakpoints_reject_unordered_tiers() {
        let tiers = vec![
            BreakpointTier {
                below: 1024,
                columns: 2,
            },
            BreakpointTier {
                below: 768,
                columns: 1,
            },
        ];
        assert!(matches!(
            Breakpoints::new(tiers, 3),
            Err(LayoutError::InvalidBreakpoints(_))
        ));
    }

    #[test]
    fn test_breakpoints_reject_zero_columns() {
        assert_eq!(
            Breakpoints::new(vec![], 0).unwrap_err(),
            LayoutError::ZeroColumns
        );
    }

    #[test]
    fn test_parse_breakpoint_tiers() {
        let tiers = parse_breakpoint_tiers("768:1, 1024:2").unwrap();
        assert_eq!(
            tiers,
            vec![
                BreakpointTier {
                    below: 768,
                    columns: 1
                },
                BreakpointTier {
                    below: 1024,
                    columns: 2
                },
            ]
        );
        assert!(parse_breakpoint_tiers("").unwrap().is_empty());
        assert!(parse_breakpoint_tiers("768").is_err());
        assert!(parse_breakpoint_tiers("wide:2").is_err());
    }

    // ── dimensions ──────────────────────────────────────────────────────────

    #[test]
    fn test_cell_size_uses_padding_and_aspect_ratio() {
        // (1216 - 16) / 3 = 400; 400 * 9 / 16 = 225
        let dims = GridDimensions::new(3, 1216, 16).unwrap();
        assert_eq!(dims.cell_width, 400);
        assert_eq!(dims.cell_height, 225);
    }

    #[test]
    fn test_cell_width_floors() {
        // (1000 - 16) / 3 = 328.0 → 328; 328 * 9 / 16 = 184.5 → 184
        let dims = GridDimensions::new(3, 1000, 16).unwrap();
        assert_eq!(dims.cell_width, 328);
        assert_eq!(dims.cell_height, 184);
    }

    #[test]
    fn test_narrow_container_is_rejected() {
        assert!(matches!(
            GridDimensions::new(3, 10, 16),
            Err(LayoutError::ContainerTooNarrow { .. })
        ));
    }

    #[test]
    fn test_oversized_width_is_rejected_without_overflow() {
        assert_eq!(
            GridDimensions::new(3, u32::MAX, 16).unwrap_err(),
            LayoutError::ContainerTooWide {
                container_width: u32::MAX,
                max: MAX_CONTAINER_WIDTH_PX,
            }
        );
        assert!(GridDimensions::new(2, MAX_CONTAINER_WIDTH_PX, 16).is_ok());
        assert_eq!(
            resolve_grid(4_000_000_000, &GridConfig::default()),
            GridResolution::NotReady
        );
    }

    #[test]
    fn test_column_count_is_capped() {
        assert_eq!(
            GridDimensions::new(1_000_000_000, 4_000, 16).unwrap_err(),
            LayoutError::TooManyColumns {
                columns: 1_000_000_000,
                max: MAX_COLUMNS,
            }
        );
        assert!(matches!(
            Breakpoints::new(vec![], MAX_COLUMNS + 1),
            Err(LayoutError::TooManyColumns { .. })
        ));
    }

    #[test]
    fn test_dense_padding_applies_from_four_columns() {
        let config = GridConfig::default();
        assert_eq!(config.padding_for(3), 16);
        assert_eq!(config.padding_for(4), 12);
    }

    // ── resolve_grid ────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_zero_width_is_not_ready() {
        assert_eq!(
            resolve_grid(0, &GridConfig::default()),
            GridResolution::NotReady
        );
    }

    #[test]
    fn test_resolve_mobile_is_single_column() {
        assert_eq!(
            resolve_grid(600, &GridConfig::default()),
            GridResolution::SingleColumn
        );
    }

    #[test]
    fn test_resolve_desktop_is_masonry() {
        match resolve_grid(1216, &GridConfig::default()) {
            GridResolution::Masonry(dims) => {
                assert_eq!(dims.columns, 3);
                assert_eq!(dims.cell_width, 400);
            }
            other => panic!("expected masonry, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_four_column_desktop_uses_dense_padding() {
        let config = GridConfig {
            breakpoints: Breakpoints::new(
                vec![
                    BreakpointTier {
                        below: 768,
                        columns: 1,
                    },
                    BreakpointTier {
                        below: 1024,
                        columns: 2,
                    },
                ],
                4,
            )
            .unwrap(),
            ..GridConfig::default()
        };
        match resolve_grid(1452, &config) {
            // (1452 - 12) / 4 = 360
            GridResolution::Masonry(dims) => assert_eq!(dims.cell_width, 360),
            other => panic!("expected masonry, got {other:?}"),
        }
    }

    #[test]
    fn test_estimate_container_width() {
        assert_eq!(estimate_container_width(1280), 1248);
        assert_eq!(estimate_container_width(2560), 1536);
        assert_eq!(estimate_container_width(10), 0);
    }
}
