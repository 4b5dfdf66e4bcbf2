// Masonry layout engine
// Packs content tiles of 1–2 cell footprints into a dense grid and keeps the
// result current as the container resizes or the item list changes.

pub mod controller;
pub mod dimensions;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod occupancy;
pub mod placement;
pub mod sessions;
pub mod sizing;

// Re-export the API consumed by state, config and route wiring.
pub use controller::{ControllerSettings, LayoutController};
pub use dimensions::{parse_breakpoint_tiers, Breakpoints, GridConfig};
pub use engine::{EngineConfig, MasonryEngine};
pub use error::LayoutError;
pub use sessions::{spawn_reaper, GridRegistry};
pub use sizing::{QuotaSizePolicy, RandomSizePolicy, SizePolicy, SizePolicyKind};
