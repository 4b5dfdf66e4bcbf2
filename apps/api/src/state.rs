use crate::config::Config;
use crate::layout::{ControllerSettings, GridRegistry, MasonryEngine};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Engine wired with the configured footprint policy.
    /// Requests that override sizing derive a per-request engine from it.
    pub engine: MasonryEngine,
    pub controller_settings: ControllerSettings,
    /// Live grid sessions keyed by grid id.
    pub grids: GridRegistry,
}

impl AppState {
    pub fn new(config: Config, engine: MasonryEngine) -> Self {
        let controller_settings = config.controller_settings();
        Self {
            config,
            engine,
            controller_settings,
            grids: GridRegistry::default(),
        }
    }
}
