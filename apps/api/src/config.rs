use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::layout::{
    parse_breakpoint_tiers, Breakpoints, ControllerSettings, EngineConfig, GridConfig,
    QuotaSizePolicy, RandomSizePolicy, SizePolicy, SizePolicyKind,
};

/// Application configuration loaded from environment variables.
/// Every layout setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub resize_debounce_ms: u64,
    pub resize_min_delta_px: u32,
    pub grid_breakpoints: String,
    pub grid_max_columns: u32,
    pub grid_padding_px: u32,
    pub grid_dense_padding_px: u32,
    pub max_scan_rows: u32,
    /// Seed for the random footprint policy; a fresh one is drawn when unset.
    pub layout_seed: Option<u64>,
    pub wide_category: String,
    pub wide_probability: f64,
    pub size_policy: SizePolicyKind,
    /// Grid sessions untouched for this long are dropped.
    pub grid_idle_ttl_secs: u64,
    pub grid_max_sessions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            resize_debounce_ms: env_or("RESIZE_DEBOUNCE_MS", 300)?,
            resize_min_delta_px: env_or("RESIZE_MIN_DELTA_PX", 10)?,
            grid_breakpoints: std::env::var("GRID_BREAKPOINTS")
                .unwrap_or_else(|_| "768:1,1024:2".to_string()),
            grid_max_columns: env_or("GRID_MAX_COLUMNS", 3)?,
            grid_padding_px: env_or("GRID_PADDING_PX", 16)?,
            grid_dense_padding_px: env_or("GRID_DENSE_PADDING_PX", 12)?,
            max_scan_rows: env_or("LAYOUT_MAX_SCAN_ROWS", 100)?,
            layout_seed: env_opt("LAYOUT_SEED")?,
            wide_category: std::env::var("WIDE_CATEGORY")
                .unwrap_or_else(|_| "matchReport".to_string()),
            wide_probability: env_or("WIDE_PROBABILITY", 0.6)?,
            size_policy: env_or("SIZE_POLICY", SizePolicyKind::Random)?,
            grid_idle_ttl_secs: env_or("GRID_IDLE_TTL_SECS", 1800)?,
            grid_max_sessions: env_or("GRID_MAX_SESSIONS", 10_000)?,
        })
    }

    /// Builds and validates the engine configuration.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let tiers = parse_breakpoint_tiers(&self.grid_breakpoints)
            .context("GRID_BREAKPOINTS is malformed")?;
        let breakpoints = Breakpoints::new(tiers, self.grid_max_columns)
            .context("GRID_BREAKPOINTS / GRID_MAX_COLUMNS are inconsistent")?;

        let mut engine = EngineConfig {
            grid: GridConfig {
                breakpoints,
                padding: self.grid_padding_px,
                dense_padding: self.grid_dense_padding_px,
                ..GridConfig::default()
            },
            ..EngineConfig::default()
        };
        engine.limits.max_scan_rows = self.max_scan_rows;
        engine
            .validate()
            .context("LAYOUT_MAX_SCAN_ROWS must be at least 1")?;
        Ok(engine)
    }

    /// The policy named by `SIZE_POLICY`.
    pub fn size_policy(&self) -> Result<Arc<dyn SizePolicy>> {
        Ok(match self.size_policy {
            SizePolicyKind::Random => {
                let seed = self.layout_seed.unwrap_or_else(rand::random);
                Arc::new(self.random_policy(seed)?)
            }
            SizePolicyKind::Quota => Arc::new(self.quota_policy()),
        })
    }

    pub fn random_policy(&self, seed: u64) -> Result<RandomSizePolicy> {
        RandomSizePolicy::new(seed)
            .with_wide_category(self.wide_category.clone(), self.wide_probability)
            .context("WIDE_PROBABILITY must be between 0 and 1")
    }

    pub fn quota_policy(&self) -> QuotaSizePolicy {
        QuotaSizePolicy::with_wide_category(self.wide_category.clone())
    }

    pub fn grid_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.grid_idle_ttl_secs)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            debounce: Duration::from_millis(self.resize_debounce_ms),
            min_resize_delta: self.resize_min_delta_px,
        }
    }
}

#[cfg(test)]
impl Config {
    /// Built-in defaults with a pinned seed, independent of the process environment.
    pub(crate) fn test_default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            resize_debounce_ms: 300,
            resize_min_delta_px: 10,
            grid_breakpoints: "768:1,1024:2".to_string(),
            grid_max_columns: 3,
            grid_padding_px: 16,
            grid_dense_padding_px: 12,
            max_scan_rows: 100,
            layout_seed: Some(9),
            wide_category: "matchReport".to_string(),
            wide_probability: 0.6,
            size_policy: SizePolicyKind::Random,
            grid_idle_ttl_secs: 1800,
            grid_max_sessions: 10_000,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(env_opt(key)?.unwrap_or(default))
}

fn env_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(None),
    }
}
