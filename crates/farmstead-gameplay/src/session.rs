//! Farm session.
//!
//! Bundles the grid, inventory and arbiter with a clock, and drives them one
//! tick at a time. Persistence is passed in explicitly for every save and
//! load.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::crop::{GrowthConfig, HarvestConfig};
use crate::grid::{FarmGrid, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};
use crate::interaction::{
    Commit, InteractionArbiter, InteractionConfig, InteractionResult, TickInput,
};
use crate::inventory::{Inventory, DEFAULT_CAPACITY};
use crate::item::display_name_for;
use crate::save::{DocumentStorage, LoadReport, Persistence, SaveError, SaveResult};
use crate::visual::StageAssets;

/// Farm tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Cells per row
    pub grid_width: u16,
    /// Number of rows
    pub grid_height: u16,
    /// Inventory slot count
    pub inventory_capacity: usize,
    /// Seed kind granted to a fresh farm
    pub starter_seed_kind: String,
    /// Number of starter seeds (0 disables)
    pub starter_seed_count: u32,
    /// Growth tunables
    pub growth: GrowthConfig,
    /// Harvest yields
    pub harvest: HarvestConfig,
    /// Hold durations
    pub interaction: InteractionConfig,
    /// Stage assets
    pub assets: StageAssets,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            inventory_capacity: DEFAULT_CAPACITY,
            starter_seed_kind: "plant_seed".to_string(),
            starter_seed_count: 1000,
            growth: GrowthConfig::default(),
            harvest: HarvestConfig::default(),
            interaction: InteractionConfig::default(),
            assets: StageAssets::default(),
        }
    }
}

/// A running farm.
#[derive(Debug)]
pub struct FarmSession {
    config: FarmConfig,
    grid: FarmGrid,
    inventory: Inventory,
    arbiter: InteractionArbiter,
    clock: Box<dyn Clock>,
    /// Total ticked time (seconds)
    play_time: f64,
    /// Ticked time since the last save (seconds)
    time_since_save: f64,
    /// Auto-save interval (seconds, 0 disables)
    auto_save_interval: f64,
}

impl FarmSession {
    /// Creates an empty farm from config.
    #[must_use]
    pub fn new(config: FarmConfig, clock: Box<dyn Clock>) -> Self {
        let grid = FarmGrid::new(config.grid_width, config.grid_height)
            .with_growth(config.growth.clone())
            .with_harvest(config.harvest.clone())
            .with_assets(config.assets.clone());
        let inventory = Inventory::new(config.inventory_capacity);
        let arbiter = InteractionArbiter::with_config(config.interaction.clone());

        Self {
            config,
            grid,
            inventory,
            arbiter,
            clock,
            play_time: 0.0,
            time_since_save: 0.0,
            auto_save_interval: 0.0,
        }
    }

    /// Sets the auto-save interval (seconds, 0 disables).
    #[must_use]
    pub fn with_auto_save_interval(mut self, seconds: f64) -> Self {
        self.auto_save_interval = seconds.max(0.0);
        self
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    /// Gets the grid.
    #[must_use]
    pub fn grid(&self) -> &FarmGrid {
        &self.grid
    }

    /// Gets the grid mutably.
    pub fn grid_mut(&mut self) -> &mut FarmGrid {
        &mut self.grid
    }

    /// Gets the inventory.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Gets the inventory mutably.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Gets the arbiter.
    #[must_use]
    pub fn arbiter(&self) -> &InteractionArbiter {
        &self.arbiter
    }

    /// Current clock time (Unix seconds).
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Total ticked time (seconds).
    #[must_use]
    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    /// Advances the farm by one tick.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> InteractionResult<Option<Commit>> {
        let now = self.clock.now();
        let step = f64::from(dt.max(0.0));
        self.play_time += step;
        self.time_since_save += step;

        self.grid.refresh_growth(now);
        self.arbiter
            .tick(input, dt, &mut self.grid, &mut self.inventory, now)
    }

    /// Gives the starter seeds if the inventory is empty.
    ///
    /// Returns true if seeds were granted.
    pub fn grant_starter_seeds(&mut self) -> bool {
        let count = self.config.starter_seed_count;
        if !self.inventory.is_empty() || count == 0 {
            return false;
        }
        let kind = self.config.starter_seed_kind.clone();
        match self.inventory.add(&kind, &display_name_for(&kind), count) {
            Ok(_) => {
                info!(kind = %kind, count, "granted starter seeds");
                true
            },
            Err(e) => {
                debug!(error = %e, "starter seeds not granted");
                false
            },
        }
    }

    /// Saves the farm.
    pub fn save<S: DocumentStorage>(&mut self, persistence: &mut Persistence<S>) -> SaveResult<()> {
        persistence.save(&self.grid, &self.inventory, self.clock.now())?;
        self.mark_saved();
        Ok(())
    }

    /// Loads the farm, dropping any in-progress hold.
    pub fn load<S: DocumentStorage>(&mut self, persistence: &Persistence<S>) -> SaveResult<LoadReport> {
        let report = persistence.load(&mut self.grid, &mut self.inventory)?;
        self.arbiter.cancel();
        self.mark_saved();
        Ok(report)
    }

    /// Loads the farm if a save exists, then grants starter seeds if needed.
    ///
    /// A missing save is a fresh start and returns `Ok(None)`.
    pub fn start<S: DocumentStorage>(
        &mut self,
        persistence: &Persistence<S>,
    ) -> SaveResult<Option<LoadReport>> {
        let report = match self.load(persistence) {
            Ok(report) => Some(report),
            Err(SaveError::NotFound(_)) => {
                info!("no save found, starting a fresh farm");
                None
            },
            Err(e) => return Err(e),
        };
        self.grant_starter_seeds();
        Ok(report)
    }

    /// Check if auto-save is due.
    #[must_use]
    pub fn should_auto_save(&self) -> bool {
        self.auto_save_interval > 0.0 && self.time_since_save >= self.auto_save_interval
    }

    /// Resets the auto-save timer.
    pub fn mark_saved(&mut self) {
        self.time_since_save = 0.0;
    }
}
