//! Engine configuration.
//!
//! Farm tunables plus save and loop settings. Configuration can be loaded
//! from and saved to a TOML file.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use farmstead_gameplay::{FarmConfig, DEFAULT_SAVE_FILE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "farmstead.toml";

/// Application directory name under the platform config and data dirs.
const APP_DIR: &str = "farmstead";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Save Settings ===
    /// Directory holding the save file
    pub save_dir: PathBuf,
    /// Save file name
    pub save_file: String,
    /// Auto-save interval in seconds (0 disables)
    pub auto_save_interval: f64,

    // === Loop Settings ===
    /// Simulation ticks per second
    pub tick_rate: u32,

    // === Farm Settings ===
    /// Grid, inventory, growth, harvest and interaction tunables
    pub farm: FarmConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            save_file: DEFAULT_SAVE_FILE.to_string(),
            auto_save_interval: 60.0,
            tick_rate: 60,
            farm: FarmConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join(APP_DIR).join(CONFIG_FILE),
        )
    }

    /// Full path of the save file.
    #[must_use]
    pub fn save_path(&self) -> PathBuf {
        self.save_dir.join(&self.save_file)
    }

    /// Seconds per simulation tick.
    #[must_use]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Loop
        self.tick_rate = self.tick_rate.clamp(10, 240);
        self.auto_save_interval = self.auto_save_interval.max(0.0);
        if self.save_file.is_empty() {
            self.save_file = DEFAULT_SAVE_FILE.to_string();
        }

        // Farm
        let farm = &mut self.farm;
        farm.grid_width = farm.grid_width.clamp(1, 64);
        farm.grid_height = farm.grid_height.clamp(1, 64);
        farm.inventory_capacity = farm.inventory_capacity.clamp(1, 64);
        farm.growth.default_growth_duration = farm.growth.default_growth_duration.max(0.0);

        // Interaction
        let holds = &mut farm.interaction;
        holds.plant_hold = holds.plant_hold.clamp(0.0, 10.0);
        holds.harvest_hold = holds.harvest_hold.clamp(0.0, 10.0);
        holds.water_hold = holds.water_hold.clamp(0.0, 10.0);
    }
}

/// Platform data directory for saves, falling back to a local directory.
fn default_save_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("saves"), |dir| dir.join(APP_DIR))
}
