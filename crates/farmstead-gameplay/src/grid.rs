//! The farm grid.
//!
//! Owns every planting spot in a fixed row-major layout. All spot mutations
//! go through the grid so each one queues exactly one [`VisualEvent`].

use farmstead_common::{CellCoord, SpotId};
use tracing::debug;

use crate::crop::{Crop, GrowthConfig, HarvestConfig};
use crate::item::ItemStack;
use crate::planting::{PlantingSpot, SpotState};
use crate::visual::{StageAssets, VisualEvent, VisualEventKind};

/// Default grid width (cells per row).
pub const DEFAULT_GRID_WIDTH: u16 = 6;
/// Default grid height (rows).
pub const DEFAULT_GRID_HEIGHT: u16 = 4;

/// A fixed rectangle of planting spots.
#[derive(Debug, Clone)]
pub struct FarmGrid {
    width: u16,
    height: u16,
    spots: Vec<PlantingSpot>,
    growth: GrowthConfig,
    harvest: HarvestConfig,
    assets: StageAssets,
    /// Visual events waiting to be drained by the front end
    pending: Vec<VisualEvent>,
}

impl Default for FarmGrid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT)
    }
}

impl FarmGrid {
    /// Creates a grid of empty spots.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let count = width as usize * height as usize;
        let spots = (0..count)
            .map(|index| {
                PlantingSpot::new(SpotId::from_index(index), CellCoord::from_index(index, width))
            })
            .collect();

        Self {
            width,
            height,
            spots,
            growth: GrowthConfig::default(),
            harvest: HarvestConfig::default(),
            assets: StageAssets::default(),
            pending: Vec::new(),
        }
    }

    /// Sets growth tunables.
    #[must_use]
    pub fn with_growth(mut self, growth: GrowthConfig) -> Self {
        self.growth = growth;
        self
    }

    /// Sets harvest yields.
    #[must_use]
    pub fn with_harvest(mut self, harvest: HarvestConfig) -> Self {
        self.harvest = harvest;
        self
    }

    /// Sets stage assets.
    #[must_use]
    pub fn with_assets(mut self, assets: StageAssets) -> Self {
        self.assets = assets;
        self
    }

    /// Grid width.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Grid height.
    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Number of spots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spots.len()
    }

    /// Check if the grid has no spots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Growth tunables.
    #[must_use]
    pub fn growth(&self) -> &GrowthConfig {
        &self.growth
    }

    /// Harvest yields.
    #[must_use]
    pub fn harvest_config(&self) -> &HarvestConfig {
        &self.harvest
    }

    /// Stage assets.
    #[must_use]
    pub fn assets(&self) -> &StageAssets {
        &self.assets
    }

    /// Get a spot by id.
    #[must_use]
    pub fn spot(&self, id: SpotId) -> Option<&PlantingSpot> {
        self.spots.get(id.index())
    }

    /// Get a spot by cell.
    #[must_use]
    pub fn spot_at(&self, cell: CellCoord) -> Option<&PlantingSpot> {
        self.id_at(cell).and_then(|id| self.spot(id))
    }

    /// Id of the spot at a cell, if the cell is on the grid.
    #[must_use]
    pub fn id_at(&self, cell: CellCoord) -> Option<SpotId> {
        cell.is_within(self.width, self.height)
            .then(|| SpotId::from_index(cell.to_index(self.width)))
    }

    /// Iterate spots in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &PlantingSpot> {
        self.spots.iter()
    }

    /// Number of spots holding a crop.
    #[must_use]
    pub fn planted_count(&self) -> usize {
        self.spots.iter().filter(|spot| spot.has_crop()).count()
    }

    /// Plants a seed using the configured growth duration.
    ///
    /// Returns false if the spot does not exist or is occupied.
    pub fn plant(&mut self, id: SpotId, kind: &str, now: f64) -> bool {
        let duration = self.growth.default_growth_duration;
        let Some(spot) = self.spots.get_mut(id.index()) else {
            return false;
        };
        if !spot.plant(kind, now, duration) {
            return false;
        }
        let crop = spot.crop().cloned();
        self.push_crop_event(id, VisualEventKind::Planted, crop.as_ref());
        true
    }

    /// Waters a spot. Returns true if a young crop matured.
    pub fn water(&mut self, id: SpotId) -> bool {
        let Some(spot) = self.spots.get_mut(id.index()) else {
            return false;
        };
        if !spot.water() {
            return false;
        }
        let crop = spot.crop().cloned();
        self.push_crop_event(id, VisualEventKind::Watered, crop.as_ref());
        true
    }

    /// Items a harvest of the spot would yield, without harvesting.
    #[must_use]
    pub fn preview_harvest(&self, id: SpotId) -> Option<Vec<ItemStack>> {
        self.spot(id)?.preview_harvest(&self.harvest)
    }

    /// Harvests a spot, clearing it and returning its yield.
    pub fn harvest(&mut self, id: SpotId) -> Option<Vec<ItemStack>> {
        let items = self.spots.get_mut(id.index())?.harvest(&self.harvest)?;
        self.push_crop_event(id, VisualEventKind::Harvested, None);
        Some(items)
    }

    /// Applies the maturation policy to every crop.
    ///
    /// Returns how many crops matured.
    pub fn refresh_growth(&mut self, now: f64) -> usize {
        let policy = self.growth.maturation;
        let mut matured = Vec::new();
        for spot in &mut self.spots {
            if spot.refresh(now, policy) {
                matured.push((spot.id(), spot.crop().cloned()));
            }
        }
        for (id, crop) in &matured {
            debug!(spot = %id, "matured over time");
            self.push_crop_event(*id, VisualEventKind::Watered, crop.as_ref());
        }
        matured.len()
    }

    /// Snapshot of every spot in enumeration order.
    #[must_use]
    pub fn states(&self) -> Vec<SpotState> {
        self.spots.iter().map(PlantingSpot::state).collect()
    }

    /// Restores one spot from a planted snapshot, replacing its crop.
    ///
    /// Unplanted snapshots leave the spot as it is. Returns true if a crop
    /// was restored.
    pub fn load_state(&mut self, id: SpotId, state: &SpotState) -> bool {
        let Some(spot) = self.spots.get_mut(id.index()) else {
            return false;
        };
        if !spot.load_state(state) {
            return false;
        }
        let crop = spot.crop().cloned();
        self.push_crop_event(id, VisualEventKind::Restored, crop.as_ref());
        true
    }

    /// Removes every crop without yielding anything.
    pub fn clear_all(&mut self) {
        let cleared: Vec<SpotId> = self
            .spots
            .iter_mut()
            .filter_map(|spot| spot.clear().then(|| spot.id()))
            .collect();
        for id in cleared {
            self.push_crop_event(id, VisualEventKind::Cleared, None);
        }
    }

    /// Take pending visual events (clears the queue).
    pub fn take_visual_events(&mut self) -> Vec<VisualEvent> {
        std::mem::take(&mut self.pending)
    }

    fn push_crop_event(&mut self, spot: SpotId, kind: VisualEventKind, crop: Option<&Crop>) {
        let stage = crop.map(Crop::stage);
        self.pending.push(VisualEvent {
            spot,
            kind,
            stage,
            tint: crop.map(Crop::tint),
            asset: stage.map(|stage| self.assets.asset_for(stage).to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::{GrowthStage, MaturationPolicy};

    #[test]
    fn test_layout_is_row_major() {
        let grid = FarmGrid::default();
        assert_eq!(grid.len(), 24);

        let id = grid.id_at(CellCoord::new(2, 1)).expect("on grid");
        assert_eq!(id.index(), 8);
        assert_eq!(grid.spot(id).expect("spot").position(), CellCoord::new(2, 1));
        assert!(grid.id_at(CellCoord::new(6, 0)).is_none());
    }

    #[test]
    fn test_one_crop_per_cell() {
        let mut grid = FarmGrid::new(2, 2);
        let id = SpotId::from_index(3);

        assert!(grid.plant(id, "wheat_seed", 0.0));
        assert!(!grid.plant(id, "corn_seed", 1.0));
        assert_eq!(grid.spot(id).and_then(PlantingSpot::crop).map(Crop::kind), Some("wheat_seed"));
        assert_eq!(grid.planted_count(), 1);
    }

    #[test]
    fn test_mutations_emit_events() {
        let mut grid = FarmGrid::new(2, 1);
        let id = SpotId::from_index(0);

        grid.plant(id, "wheat_seed", 0.0);
        grid.water(id);
        grid.water(id);
        grid.harvest(id);

        let events = grid.take_visual_events();
        let kinds: Vec<_> = events.iter().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VisualEventKind::Planted,
                VisualEventKind::Watered,
                VisualEventKind::Harvested
            ]
        );
        assert_eq!(events[0].asset.as_deref(), Some("small-plant"));
        assert_eq!(events[1].stage, Some(GrowthStage::Mature));
        assert_eq!(events[2].stage, None);
        assert!(grid.take_visual_events().is_empty());
    }

    #[test]
    fn test_refresh_growth_respects_policy() {
        let mut grid = FarmGrid::new(2, 1);
        let id = SpotId::from_index(0);
        grid.plant(id, "wheat_seed", 0.0);
        assert_eq!(grid.refresh_growth(100.0), 0);

        let mut timed = FarmGrid::new(2, 1).with_growth(GrowthConfig {
            default_growth_duration: 10.0,
            maturation: MaturationPolicy::OnWaterOrElapsed,
        });
        timed.plant(id, "wheat_seed", 0.0);
        assert_eq!(timed.refresh_growth(5.0), 0);
        assert_eq!(timed.refresh_growth(10.0), 1);
        assert_eq!(timed.refresh_growth(20.0), 0);
        assert!(timed.spot(id).expect("spot").can_harvest_mature());
    }

    #[test]
    fn test_states_and_load() {
        let mut grid = FarmGrid::new(3, 1);
        grid.plant(SpotId::from_index(1), "wheat_seed", 5.0);
        grid.water(SpotId::from_index(1));
        let states = grid.states();

        let mut other = FarmGrid::new(3, 1);
        other.plant(SpotId::from_index(0), "corn_seed", 1.0);
        assert!(!other.load_state(SpotId::from_index(0), &SpotState::empty()));
        assert_eq!(other.planted_count(), 1);

        other.clear_all();
        for (index, state) in states.iter().enumerate() {
            other.load_state(SpotId::from_index(index), state);
        }

        assert_eq!(other.states(), states);
    }

    #[test]
    fn test_clear_all() {
        let mut grid = FarmGrid::new(2, 2);
        grid.plant(SpotId::from_index(0), "a_seed", 0.0);
        grid.plant(SpotId::from_index(2), "b_seed", 0.0);
        grid.take_visual_events();

        grid.clear_all();
        assert_eq!(grid.planted_count(), 0);
        assert_eq!(grid.take_visual_events().len(), 2);
    }
}
