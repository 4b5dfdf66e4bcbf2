use thiserror::Error;

/// Configuration and input errors raised by the layout engine.
///
/// Runtime conditions such as an unmeasured container or a single-column
/// viewport are not errors; they surface as `LayoutOutcome` variants.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("column count must be at least 1")]
    ZeroColumns,

    #[error("container width {container_width}px leaves no room for {columns} columns")]
    ContainerTooNarrow { container_width: u32, columns: u32 },

    #[error("container width {container_width}px exceeds the {max}px limit")]
    ContainerTooWide { container_width: u32, max: u32 },

    #[error("{columns} columns exceeds the limit of {max}")]
    TooManyColumns { columns: u32, max: u32 },

    #[error("invalid breakpoints: {0}")]
    InvalidBreakpoints(String),

    #[error("invalid search limits: {0}")]
    InvalidLimits(String),

    #[error("invalid size policy: {0}")]
    InvalidPolicy(String),
}
