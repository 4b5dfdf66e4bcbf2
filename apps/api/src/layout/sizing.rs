//! Size Assignor — gives every content item a cell footprint.
//!
//! A pluggable `SizePolicy` sees the whole list and returns one footprint per
//! item. `RandomSizePolicy` and `QuotaSizePolicy` are the production choices;
//! tests and clients with their own sizing use `FixedSizePolicy` or
//! `UniformSizePolicy`. Widths are clamped to the column count here so the
//! placement search never sees a footprint it cannot fit.

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::error::LayoutError;
use crate::models::content::ContentItem;

// ────────────────────────────────────────────────────────────────────────────
// Footprint
// ────────────────────────────────────────────────────────────────────────────

/// Width × height of a tile, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardSize {
    pub width: u32,
    pub height: u32,
}

impl CardSize {
    pub const STANDARD: CardSize = CardSize::new(1, 1);
    pub const WIDE: CardSize = CardSize::new(2, 1);
    pub const TALL: CardSize = CardSize::new(1, 2);
    pub const HERO: CardSize = CardSize::new(2, 2);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Narrows the footprint to at most `columns` cells; height is kept.
    pub fn clamp_to(self, columns: u32) -> Self {
        Self {
            width: self.width.min(columns),
            height: self.height,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Policy trait
// ────────────────────────────────────────────────────────────────────────────

/// Decides the footprint of every item in a list.
///
/// Implementations must be pure: the same list always maps to the same
/// footprints for a given policy value. The result is index-aligned with
/// `items`; widths may exceed the column count and are clamped afterwards.
pub trait SizePolicy: Send + Sync {
    /// `featured_divisor` sets the hero quota for policies that use the shared
    /// featured rule (`total / featured_divisor`).
    fn assign(&self, items: &[ContentItem], featured_divisor: usize) -> Vec<CardSize>;

    /// Short label for logs and API responses.
    fn name(&self) -> &'static str;
}

/// Number of featured items allowed to become heroes in a list of `total`.
pub fn hero_quota(total: usize, featured_divisor: usize) -> usize {
    total.checked_div(featured_divisor).unwrap_or(0)
}

/// Featured items become heroes up to the quota; `pick` decides the rest.
fn featured_then<F>(items: &[ContentItem], featured_divisor: usize, mut pick: F) -> Vec<CardSize>
where
    F: FnMut(&ContentItem, usize) -> CardSize,
{
    let quota = hero_quota(items.len(), featured_divisor);
    let mut heroes = 0usize;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_featured && heroes < quota {
                heroes += 1;
                CardSize::HERO
            } else {
                pick(item, index)
            }
        })
        .collect()
}

/// Selects a production policy from configuration or a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePolicyKind {
    #[default]
    Random,
    Quota,
}

impl FromStr for SizePolicyKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SizePolicyKind::Random),
            "quota" => Ok(SizePolicyKind::Quota),
            other => Err(LayoutError::InvalidPolicy(format!(
                "unknown size policy '{other}' (expected 'random' or 'quota')"
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RandomSizePolicy
// ────────────────────────────────────────────────────────────────────────────

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the item id, started from the offset basis xor `seed`.
/// Fixed arithmetic, so a seed reproduces across builds and toolchains.
fn item_seed(seed: u64, id: &str) -> u64 {
    id.bytes()
        .fold(FNV_OFFSET ^ seed, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

/// Weighted random footprints, reproducible for a fixed seed.
///
/// Each item draws from its own RNG seeded by `(seed, item.id)`, so an item
/// keeps its footprint when the list around it is filtered or reordered.
#[derive(Debug, Clone)]
pub struct RandomSizePolicy {
    seed: u64,
    wide_category: String,
    wide_category_probability: f64,
    tall_share: f64,
    wide_share: f64,
}

impl RandomSizePolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            wide_category: "matchReport".to_string(),
            wide_category_probability: 0.6,
            tall_share: 0.15,
            wide_share: 0.30,
        }
    }

    pub fn with_wide_category(
        mut self,
        category: impl Into<String>,
        probability: f64,
    ) -> Result<Self, LayoutError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(LayoutError::InvalidPolicy(format!(
                "wide category probability {probability} is outside [0, 1]"
            )));
        }
        self.wide_category = category.into();
        self.wide_category_probability = probability;
        Ok(self)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Footprint for one non-hero item.
    pub fn size_for(&self, item: &ContentItem) -> CardSize {
        let mut rng = StdRng::seed_from_u64(item_seed(self.seed, &item.id));

        if item.category == self.wide_category && rng.gen_bool(self.wide_category_probability) {
            return CardSize::WIDE;
        }

        let roll: f64 = rng.gen();
        if roll < self.tall_share {
            CardSize::TALL
        } else if roll < self.tall_share + self.wide_share {
            CardSize::WIDE
        } else {
            CardSize::STANDARD
        }
    }
}

impl SizePolicy for RandomSizePolicy {
    fn assign(&self, items: &[ContentItem], featured_divisor: usize) -> Vec<CardSize> {
        featured_then(items, featured_divisor, |item, _| self.size_for(item))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// QuotaSizePolicy
// ────────────────────────────────────────────────────────────────────────────

/// Target counts for one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeQuotas {
    pub hero: usize,
    pub wide: usize,
    pub tall: usize,
}

impl SizeQuotas {
    /// 10% heroes (min 1), 15% wide and 15% tall (min 2 each). Lists under
    /// eight items get at most one of each, from 10% / 20% / 20%.
    pub fn for_total(total: usize) -> Self {
        if total < 8 {
            return Self {
                hero: (total / 10).min(1),
                wide: (total / 5).min(1),
                tall: (total / 5).min(1),
            };
        }
        Self {
            hero: (total / 10).max(1),
            wide: (total * 15 / 100).max(2),
            tall: (total * 15 / 100).max(2),
        }
    }
}

/// Deterministic footprints from per-size quotas.
///
/// Featured items take heroes first. Remaining heroes, wide and tall tiles are
/// spread at a fixed interval over the unassigned items so large tiles do not
/// cluster; items in the wide category are preferred for wide tiles. The
/// shared featured divisor is not used.
#[derive(Debug, Clone)]
pub struct QuotaSizePolicy {
    wide_category: String,
}

impl Default for QuotaSizePolicy {
    fn default() -> Self {
        Self {
            wide_category: "matchReport".to_string(),
        }
    }
}

impl QuotaSizePolicy {
    pub fn with_wide_category(category: impl Into<String>) -> Self {
        Self {
            wide_category: category.into(),
        }
    }
}

/// Walks `candidates` from `start`, assigning `size` to unassigned items and
/// skipping `interval` after each hit, until `quota` is reached.
fn spread(
    slots: &mut [Option<CardSize>],
    candidates: &[usize],
    start: usize,
    interval: usize,
    quota: usize,
    placed: &mut usize,
    size: CardSize,
) {
    let mut position = start;
    while *placed < quota && position < candidates.len() {
        let index = candidates[position];
        if slots[index].is_none() {
            slots[index] = Some(size);
            *placed += 1;
            position += interval;
        } else {
            position += 1;
        }
    }
}

impl SizePolicy for QuotaSizePolicy {
    fn assign(&self, items: &[ContentItem], _featured_divisor: usize) -> Vec<CardSize> {
        let quotas = SizeQuotas::for_total(items.len());
        let mut slots: Vec<Option<CardSize>> = vec![None; items.len()];

        let mut heroes = 0usize;
        for (index, item) in items.iter().enumerate() {
            if item.is_featured && heroes < quotas.hero {
                slots[index] = Some(CardSize::HERO);
                heroes += 1;
            }
        }

        let remaining: Vec<usize> = (0..items.len()).filter(|&i| slots[i].is_none()).collect();
        let large = (quotas.hero - heroes) + quotas.wide + quotas.tall;
        let interval = remaining.len().checked_div(large).unwrap_or(0).max(2);

        spread(
            &mut slots,
            &remaining,
            0,
            interval,
            quotas.hero,
            &mut heroes,
            CardSize::HERO,
        );

        // Wide: the preferred category, or every `interval`-th open item.
        let mut wide = 0usize;
        let mut position = interval / 2;
        for (index, item) in items.iter().enumerate() {
            if wide >= quotas.wide || slots[index].is_some() {
                continue;
            }
            if item.category == self.wide_category || position % interval == 0 {
                slots[index] = Some(CardSize::WIDE);
                wide += 1;
            }
            position += 1;
        }
        spread(
            &mut slots,
            &remaining,
            1,
            interval,
            quotas.wide,
            &mut wide,
            CardSize::WIDE,
        );

        let mut tall = 0usize;
        spread(
            &mut slots,
            &remaining,
            interval / 3,
            interval,
            quotas.tall,
            &mut tall,
            CardSize::TALL,
        );

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(CardSize::STANDARD))
            .collect()
    }

    fn name(&self) -> &'static str {
        "quota"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Deterministic policies
// ────────────────────────────────────────────────────────────────────────────

/// Footprints supplied up front, one per index. Indices past the end get
/// the standard footprint.
#[derive(Debug, Clone, Default)]
pub struct FixedSizePolicy {
    sizes: Vec<CardSize>,
}

impl FixedSizePolicy {
    pub fn new(sizes: Vec<CardSize>) -> Result<Self, LayoutError> {
        if let Some(bad) = sizes
            .iter()
            .find(|s| !(1..=2).contains(&s.width) || !(1..=2).contains(&s.height))
        {
            return Err(LayoutError::InvalidPolicy(format!(
                "footprint {}x{} is outside 1..=2 cells",
                bad.width, bad.height
            )));
        }
        Ok(Self { sizes })
    }
}

impl SizePolicy for FixedSizePolicy {
    fn assign(&self, items: &[ContentItem], featured_divisor: usize) -> Vec<CardSize> {
        featured_then(items, featured_divisor, |_, index| {
            self.sizes
                .get(index)
                .copied()
                .unwrap_or(CardSize::STANDARD)
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Same footprint for every non-hero item.
#[derive(Debug, Clone, Copy)]
pub struct UniformSizePolicy(pub CardSize);

impl SizePolicy for UniformSizePolicy {
    fn assign(&self, items: &[ContentItem], featured_divisor: usize) -> Vec<CardSize> {
        featured_then(items, featured_divisor, |_, _| self.0)
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Assignor
// ────────────────────────────────────────────────────────────────────────────

/// Runs a policy over the list and clamps widths to the column count.
pub struct SizeAssignor<'a> {
    policy: &'a dyn SizePolicy,
    featured_divisor: usize,
}

impl<'a> SizeAssignor<'a> {
    pub fn new(policy: &'a dyn SizePolicy, featured_divisor: usize) -> Self {
        Self {
            policy,
            featured_divisor,
        }
    }

    /// One footprint per item, index-aligned, every width `<= columns`.
    pub fn assign_all(&self, items: &[ContentItem], columns: u32) -> Vec<CardSize> {
        let sizes = self.policy.assign(items, self.featured_divisor);

        items
            .iter()
            .zip(sizes)
            .map(|(item, size)| {
                let clamped = size.clamp_to(columns);
                if clamped != size {
                    debug!(
                        item_id = %item.id,
                        width = size.width,
                        columns,
                        "Clamped footprint width to column count"
                    );
                }
                clamped
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
