//! Presentation hooks.
//!
//! The core never renders. Each state change on a planting spot queues a
//! [`VisualEvent`] that a front end drains and maps onto its own assets.

use farmstead_common::SpotId;
use serde::{Deserialize, Serialize};

use crate::crop::GrowthStage;

/// What happened to a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualEventKind {
    /// A seed was planted
    Planted,
    /// A crop was watered and matured
    Watered,
    /// A crop was harvested and removed
    Harvested,
    /// A crop was recreated from saved state
    Restored,
    /// A crop was removed without a harvest
    Cleared,
}

/// A visual change for a planting spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEvent {
    /// Affected spot
    pub spot: SpotId,
    /// Kind of change
    pub kind: VisualEventKind,
    /// Stage after the change (None when the spot is now empty)
    pub stage: Option<GrowthStage>,
    /// Tint palette index of the crop, if any
    pub tint: Option<u8>,
    /// Asset that should represent the spot, if any
    pub asset: Option<String>,
}

/// Asset names per growth stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageAssets {
    /// Asset for young crops
    pub young: String,
    /// Asset for mature crops
    pub mature: String,
    /// Asset used when a stage asset is unavailable
    pub fallback: String,
}

impl Default for StageAssets {
    fn default() -> Self {
        Self {
            young: "small-plant".to_string(),
            mature: "big-plant".to_string(),
            fallback: "primitive-cylinder".to_string(),
        }
    }
}

impl StageAssets {
    /// Configured asset for a stage.
    #[must_use]
    pub fn asset_for(&self, stage: GrowthStage) -> &str {
        match stage {
            GrowthStage::Young => &self.young,
            GrowthStage::Mature => &self.mature,
        }
    }

    /// Picks the stage asset if the front end has it, otherwise the fallback.
    #[must_use]
    pub fn resolve<F>(&self, stage: GrowthStage, is_available: F) -> &str
    where
        F: Fn(&str) -> bool,
    {
        let asset = self.asset_for(stage);
        if is_available(asset) {
            asset
        } else {
            &self.fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_for_stage() {
        let assets = StageAssets::default();
        assert_eq!(assets.asset_for(GrowthStage::Young), "small-plant");
        assert_eq!(assets.asset_for(GrowthStage::Mature), "big-plant");
    }

    #[test]
    fn test_resolve_falls_back() {
        let assets = StageAssets::default();

        assert_eq!(assets.resolve(GrowthStage::Mature, |_| true), "big-plant");
        assert_eq!(
            assets.resolve(GrowthStage::Mature, |name| name == "small-plant"),
            "primitive-cylinder"
        );
    }
}
