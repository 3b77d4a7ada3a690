//! Planting spots.
//!
//! A spot is a fixed cell that holds at most one crop. It reports which
//! actions are currently valid and performs them; it never touches the
//! inventory. Callers move items in and out.

use farmstead_common::{CellCoord, SpotId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crop::{Crop, HarvestConfig, MaturationPolicy};
use crate::item::ItemStack;

/// Serializable snapshot of a spot.
///
/// When `planted` is false the remaining fields are meaningless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotState {
    /// Whether a crop occupies the spot
    pub planted: bool,
    /// Seed kind of the crop
    #[serde(default)]
    pub kind: String,
    /// Planting time (Unix seconds)
    #[serde(default)]
    pub planted_at: f64,
    /// Growth duration (seconds)
    #[serde(default)]
    pub growth_duration: f32,
    /// Whether the crop was watered
    #[serde(default)]
    pub watered: bool,
}

impl SpotState {
    /// State of an empty spot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            planted: false,
            kind: String::new(),
            planted_at: 0.0,
            growth_duration: 0.0,
            watered: false,
        }
    }

    /// Snapshot of a crop.
    #[must_use]
    pub fn from_crop(crop: &Crop) -> Self {
        Self {
            planted: true,
            kind: crop.kind().to_string(),
            planted_at: crop.planted_at(),
            growth_duration: crop.growth_duration(),
            watered: crop.is_watered(),
        }
    }
}

impl Default for SpotState {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single cell that can hold one crop.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantingSpot {
    id: SpotId,
    position: CellCoord,
    crop: Option<Crop>,
}

impl PlantingSpot {
    /// Creates an empty spot.
    #[must_use]
    pub fn new(id: SpotId, position: CellCoord) -> Self {
        Self {
            id,
            position,
            crop: None,
        }
    }

    /// Spot identifier.
    #[must_use]
    pub fn id(&self) -> SpotId {
        self.id
    }

    /// Cell the spot occupies.
    #[must_use]
    pub fn position(&self) -> CellCoord {
        self.position
    }

    /// Crop in the spot, if any.
    #[must_use]
    pub fn crop(&self) -> Option<&Crop> {
        self.crop.as_ref()
    }

    /// Check if a crop occupies the spot.
    #[must_use]
    pub fn has_crop(&self) -> bool {
        self.crop.is_some()
    }

    /// Plants a seed. Does nothing and returns false if occupied.
    pub fn plant(&mut self, kind: &str, now: f64, growth_duration: f32) -> bool {
        if self.crop.is_some() {
            return false;
        }
        self.crop = Some(Crop::new(kind, now, growth_duration));
        debug!(spot = %self.id, kind, "planted");
        true
    }

    /// True iff a young crop is present.
    #[must_use]
    pub fn can_water(&self) -> bool {
        self.crop.as_ref().is_some_and(Crop::is_young)
    }

    /// Waters the crop. Returns true if a young crop matured.
    pub fn water(&mut self) -> bool {
        let Some(crop) = self.crop.as_mut() else {
            return false;
        };
        if !crop.water() {
            return false;
        }
        debug!(spot = %self.id, kind = crop.kind(), "watered");
        true
    }

    /// True iff any crop is present.
    #[must_use]
    pub fn can_harvest(&self) -> bool {
        self.crop.is_some()
    }

    /// True iff a mature crop is present.
    #[must_use]
    pub fn can_harvest_mature(&self) -> bool {
        self.crop.as_ref().is_some_and(Crop::is_mature)
    }

    /// Items a harvest would yield right now, without harvesting.
    #[must_use]
    pub fn preview_harvest(&self, config: &HarvestConfig) -> Option<Vec<ItemStack>> {
        self.crop.as_ref().map(|crop| crop.yields(config))
    }

    /// Removes the crop and returns its yield.
    pub fn harvest(&mut self, config: &HarvestConfig) -> Option<Vec<ItemStack>> {
        let crop = self.crop.take()?;
        let items = crop.yields(config);
        debug!(spot = %self.id, kind = crop.kind(), stage = crop.stage().display_name(), "harvested");
        Some(items)
    }

    /// Snapshot of the spot.
    #[must_use]
    pub fn state(&self) -> SpotState {
        self.crop
            .as_ref()
            .map_or_else(SpotState::empty, SpotState::from_crop)
    }

    /// Recreates the spot from a planted snapshot, replacing any current crop.
    ///
    /// An unplanted snapshot leaves the spot untouched. Returns true if a
    /// crop was restored.
    pub fn load_state(&mut self, state: &SpotState) -> bool {
        if !state.planted {
            return false;
        }
        self.crop = Some(Crop::restore(
            state.kind.clone(),
            state.planted_at,
            state.growth_duration,
            state.watered,
        ));
        true
    }

    /// Removes the crop without yielding anything.
    ///
    /// Returns true if a crop was removed.
    pub fn clear(&mut self) -> bool {
        self.crop.take().is_some()
    }

    /// Applies a maturation policy. Returns true if the crop matured.
    pub fn refresh(&mut self, now: f64, policy: MaturationPolicy) -> bool {
        self.crop
            .as_mut()
            .is_some_and(|crop| crop.refresh(now, policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot() -> PlantingSpot {
        PlantingSpot::new(SpotId::from_index(0), CellCoord::new(0, 0))
    }

    #[test]
    fn test_empty_spot_queries() {
        let spot = spot();
        assert!(!spot.has_crop());
        assert!(!spot.can_water());
        assert!(!spot.can_harvest());
        assert!(!spot.can_harvest_mature());
        assert_eq!(spot.state(), SpotState::empty());
    }

    #[test]
    fn test_plant_on_occupied_is_noop() {
        let mut spot = spot();
        assert!(spot.plant("wheat_seed", 10.0, 10.0));
        let before = spot.clone();

        assert!(!spot.plant("corn_seed", 20.0, 5.0));
        assert_eq!(spot, before);
    }

    #[test]
    fn test_water_then_harvest_mature() {
        let mut spot = spot();
        spot.plant("wheat_seed", 10.0, 10.0);

        assert!(spot.can_water());
        assert!(spot.water());
        assert!(!spot.can_water());
        assert!(!spot.water());
        assert!(spot.can_harvest_mature());

        let items = spot.harvest(&HarvestConfig::default()).expect("crop present");
        assert_eq!(items.len(), 2);
        assert!(!spot.has_crop());
    }

    #[test]
    fn test_harvest_young() {
        let mut spot = spot();
        spot.plant("wheat_seed", 10.0, 10.0);

        let items = spot.harvest(&HarvestConfig::default()).expect("crop present");
        assert_eq!(items, vec![ItemStack::new("powder", "Powder", 1)]);
        assert!(spot.harvest(&HarvestConfig::default()).is_none());
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut spot = spot();
        spot.plant("wheat_seed", 10.0, 10.0);
        let before = spot.clone();

        assert!(spot.preview_harvest(&HarvestConfig::default()).is_some());
        assert_eq!(spot, before);
    }

    #[test]
    fn test_state_roundtrip_replaces_crop() {
        let mut source = spot();
        source.plant("wheat_seed", 1234.5, 7.0);
        source.water();
        let state = source.state();

        let mut target = spot();
        target.plant("corn_seed", 1.0, 1.0);
        assert!(target.load_state(&state));
        assert_eq!(target.state(), state);

        assert!(!target.load_state(&SpotState::empty()));
        assert!(target.has_crop());
        assert_eq!(target.state(), state);
    }

    #[test]
    fn test_unplanted_state_is_noop() {
        let mut spot = spot();
        spot.plant("wheat_seed", 10.0, 5.0);
        let before = spot.state();

        assert!(!spot.load_state(&SpotState::empty()));
        assert!(spot.has_crop());
        assert_eq!(spot.state(), before);

        let mut empty = self::spot();
        assert!(!empty.load_state(&SpotState::empty()));
        assert!(!empty.has_crop());
    }

    #[test]
    fn test_state_json_field_names() {
        let json = r#"{"planted":true,"kind":"wheat_seed","plantedAt":5.0,"growthDuration":10.0,"watered":true}"#;
        let state: SpotState = serde_json::from_str(json).expect("valid state");

        assert!(state.planted);
        assert_eq!(state.kind, "wheat_seed");
        assert!((state.planted_at - 5.0).abs() < f64::EPSILON);

        let sparse: SpotState = serde_json::from_str(r#"{"planted":false}"#).expect("valid state");
        assert_eq!(sparse, SpotState::empty());
    }
}
