//! Crop growth state machine.
//!
//! A crop is planted `Young` and becomes `Mature` when watered. Watering is
//! one-way and idempotent. Harvesting is valid in either stage and yields a
//! stage-dependent item set; removing the crop afterwards is the owner's job.
//!
//! Time does not age a crop under the default [`MaturationPolicy::OnWater`].
//! [`MaturationPolicy::OnWaterOrElapsed`] additionally matures a crop once its
//! growth duration has passed since planting; that check is a pure function
//! of `now - planted_at` evaluated when the grid refreshes, never a timer.

use serde::{Deserialize, Serialize};

use crate::item::{display_name_for, ItemStack, ItemTemplate};

/// Default time for a crop to grow, in seconds.
pub const DEFAULT_GROWTH_DURATION: f32 = 10.0;

/// Cosmetic tint palette (RGB, 0.0 to 1.0).
pub const TINT_PALETTE: [[f32; 3]; 8] = [
    [0.2, 0.7, 0.3], // Green
    [0.8, 0.2, 0.3], // Red
    [0.9, 0.6, 0.1], // Orange
    [0.6, 0.2, 0.7], // Purple
    [0.9, 0.8, 0.2], // Yellow
    [0.3, 0.5, 0.9], // Blue
    [0.9, 0.4, 0.6], // Pink
    [0.1, 0.8, 0.7], // Teal
];

/// Growth stage of a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrowthStage {
    /// Planted, not yet watered.
    #[default]
    Young,
    /// Watered and fully grown.
    Mature,
}

impl GrowthStage {
    /// Get the display name of this stage.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Young => "Young",
            Self::Mature => "Mature",
        }
    }

    /// Check if this is the mature stage.
    #[must_use]
    pub fn is_mature(self) -> bool {
        matches!(self, Self::Mature)
    }
}

/// How a crop reaches maturity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaturationPolicy {
    /// Only an explicit water action matures a crop.
    #[default]
    OnWater,
    /// Watering or having grown for the full growth duration matures a crop.
    OnWaterOrElapsed,
}

/// Growth tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Growth duration given to newly planted crops (seconds)
    pub default_growth_duration: f32,
    /// Maturation rule
    pub maturation: MaturationPolicy,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            default_growth_duration: DEFAULT_GROWTH_DURATION,
            maturation: MaturationPolicy::OnWater,
        }
    }
}

/// Harvest payload per growth stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Seeds returned by a mature harvest
    pub mature_seed_count: u32,
    /// Item yielded by a young crop (one of it)
    pub young_yield: ItemTemplate,
    /// Processed item yielded by a mature crop (one of it)
    pub mature_yield: ItemTemplate,
    /// Seed item returned by a mature harvest (None means the crop's own kind)
    pub mature_seed_kind: Option<ItemTemplate>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            mature_seed_count: 2,
            young_yield: ItemTemplate::new("powder", "Powder"),
            mature_yield: ItemTemplate::new("extraction", "Extraction"),
            mature_seed_kind: None,
        }
    }
}

/// A planted crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    /// Seed kind the crop was planted from
    kind: String,
    /// Planting time (Unix seconds)
    planted_at: f64,
    /// Time to grow (seconds)
    growth_duration: f32,
    /// Whether the crop has been watered
    watered: bool,
    /// Index into [`TINT_PALETTE`]
    tint: u8,
}

impl Crop {
    /// Creates a young crop planted at `planted_at`.
    #[must_use]
    pub fn new(kind: impl Into<String>, planted_at: f64, growth_duration: f32) -> Self {
        Self {
            kind: kind.into(),
            planted_at,
            growth_duration,
            watered: false,
            tint: tint_for(planted_at),
        }
    }

    /// Recreates a crop in an exact prior state.
    ///
    /// Yields the same harvest as a crop freshly planted at `planted_at`
    /// and then watered if `watered` is set.
    #[must_use]
    pub fn restore(
        kind: impl Into<String>,
        planted_at: f64,
        growth_duration: f32,
        watered: bool,
    ) -> Self {
        let mut crop = Self::new(kind, planted_at, growth_duration);
        crop.force_set_state(planted_at, growth_duration, watered);
        crop
    }

    /// Overwrites timing and watered flag without re-deriving anything.
    pub fn force_set_state(&mut self, planted_at: f64, growth_duration: f32, watered: bool) {
        self.planted_at = planted_at;
        self.growth_duration = growth_duration;
        self.watered = watered;
        self.tint = tint_for(planted_at);
    }

    /// Seed kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Planting time (Unix seconds).
    #[must_use]
    pub fn planted_at(&self) -> f64 {
        self.planted_at
    }

    /// Growth duration (seconds).
    #[must_use]
    pub fn growth_duration(&self) -> f32 {
        self.growth_duration
    }

    /// Whether the crop has been watered.
    #[must_use]
    pub fn is_watered(&self) -> bool {
        self.watered
    }

    /// Palette index of the crop's tint.
    #[must_use]
    pub fn tint(&self) -> u8 {
        self.tint
    }

    /// RGB colour of the crop's tint.
    #[must_use]
    pub fn tint_rgb(&self) -> [f32; 3] {
        TINT_PALETTE[self.tint as usize % TINT_PALETTE.len()]
    }

    /// Current growth stage.
    #[must_use]
    pub fn stage(&self) -> GrowthStage {
        if self.watered {
            GrowthStage::Mature
        } else {
            GrowthStage::Young
        }
    }

    /// Check if the crop is young.
    #[must_use]
    pub fn is_young(&self) -> bool {
        !self.watered
    }

    /// Check if the crop is mature.
    #[must_use]
    pub fn is_mature(&self) -> bool {
        self.watered
    }

    /// Waters the crop. Returns true if it went from young to mature.
    pub fn water(&mut self) -> bool {
        if self.watered {
            return false;
        }
        self.watered = true;
        true
    }

    /// Seconds elapsed since planting (never negative).
    #[must_use]
    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.planted_at).max(0.0)
    }

    /// Growth progress from 0.0 to 1.0.
    #[must_use]
    pub fn growth_progress(&self, now: f64) -> f32 {
        if self.growth_duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed(now) / f64::from(self.growth_duration)).clamp(0.0, 1.0) as f32
    }

    /// Check if the growth duration has passed.
    #[must_use]
    pub fn is_due(&self, now: f64) -> bool {
        self.elapsed(now) >= f64::from(self.growth_duration)
    }

    /// Stage under a maturation policy at time `now`.
    #[must_use]
    pub fn stage_at(&self, now: f64, policy: MaturationPolicy) -> GrowthStage {
        match policy {
            MaturationPolicy::OnWater => self.stage(),
            MaturationPolicy::OnWaterOrElapsed if self.watered || self.is_due(now) => {
                GrowthStage::Mature
            },
            MaturationPolicy::OnWaterOrElapsed => GrowthStage::Young,
        }
    }

    /// Applies the maturation policy at time `now`.
    ///
    /// Returns true if the crop matured as a result.
    pub fn refresh(&mut self, now: f64, policy: MaturationPolicy) -> bool {
        if self.stage_at(now, policy) == GrowthStage::Mature {
            self.water()
        } else {
            false
        }
    }

    /// Items a harvest would yield in the current stage.
    #[must_use]
    pub fn yields(&self, config: &HarvestConfig) -> Vec<ItemStack> {
        match self.stage() {
            GrowthStage::Young => vec![config.young_yield.stack(1)],
            GrowthStage::Mature => {
                let mut items = vec![config.mature_yield.stack(1)];
                if config.mature_seed_count > 0 {
                    let seeds = match &config.mature_seed_kind {
                        Some(template) => template.stack(config.mature_seed_count),
                        None => ItemStack::new(
                            self.kind.clone(),
                            display_name_for(&self.kind),
                            config.mature_seed_count,
                        ),
                    };
                    items.push(seeds);
                }
                items
            },
        }
    }
}

/// Derives a palette index from the planting time.
fn tint_for(planted_at: f64) -> u8 {
    let mut rng = fastrand::Rng::with_seed(planted_at.to_bits());
    rng.usize(..TINT_PALETTE.len()) as u8
}
