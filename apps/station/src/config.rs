//! # Station Configuration
//!
//! Configuration for the `stockroom` binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (highest priority)                                     │
//! │     --db ./stockroom.db                                                 │
//! │                                                                         │
//! │  2. Environment Variables                                               │
//! │     STOCKROOM_DB_PATH=/var/lib/stockroom.db                             │
//! │     STOCKROOM_COOLDOWN_MS=1500                                          │
//! │     STOCKROOM_SOUND=off                                                 │
//! │     STOCKROOM_LOW_STOCK=3                                               │
//! │                                                                         │
//! │  3. TOML Config File                                                    │
//! │     ~/.config/stockroom/station.toml (Linux)                            │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                    │
//! │     2000 ms cooldown, all symbologies, low stock below 5                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # station.toml
//! [database]
//! path = "/srv/stockroom/stockroom.db"
//!
//! [scanner]
//! cooldown_ms = 2000
//! symbologies = ["ean_13", "upc_a", "code_128"]
//! workers = 4
//! sound = true
//!
//! [inventory]
//! low_stock_threshold = 5
//! page_size = 10
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockroom_core::{
    Symbology, DEFAULT_PAGE_SIZE, DEFAULT_SCAN_COOLDOWN_MS, LOW_STOCK_THRESHOLD, MAX_PAGE_SIZE,
    MAX_QUANTITY,
};
use stockroom_scan::decoder::default_workers;
use stockroom_scan::DecoderConfig;
use tracing::{debug, info, warn};

use crate::error::{StationError, StationResult};

/// Longest cooldown accepted from configuration.
const MAX_COOLDOWN_MS: u64 = 60_000;

// =============================================================================
// Database Settings
// =============================================================================

/// Where the product catalog lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `stockroom.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Scanner Settings
// =============================================================================

/// Scan session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Minimum time between accepted scans (milliseconds).
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Symbologies the decoder tries.
    #[serde(default = "default_symbologies")]
    pub symbologies: Vec<Symbology>,

    /// Decoder worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Ring the terminal bell when a scan is accepted.
    #[serde(default = "default_true")]
    pub sound: bool,
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_SCAN_COOLDOWN_MS
}

fn default_symbologies() -> Vec<Symbology> {
    Symbology::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            cooldown_ms: default_cooldown_ms(),
            symbologies: default_symbologies(),
            workers: default_workers(),
            sound: true,
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

/// Reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Products with a quantity strictly below this are low on stock.
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: i64,

    /// Rows per page for `products list`.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_low_stock() -> i64 {
    LOW_STOCK_THRESHOLD
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            low_stock_threshold: default_low_stock(),
            page_size: default_page_size(),
        }
    }
}

// =============================================================================
// Station Configuration
// =============================================================================

/// Complete station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl StationConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (station.toml)
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> StationResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() || explicit {
                info!(?path, "Loading station config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| StationError::ConfigRead { path, source })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StationResult<()> {
        if self.scanner.cooldown_ms > MAX_COOLDOWN_MS {
            return Err(StationError::InvalidConfig(format!(
                "scanner.cooldown_ms must be at most {}, got {}",
                MAX_COOLDOWN_MS, self.scanner.cooldown_ms
            )));
        }

        if self.scanner.symbologies.is_empty() {
            return Err(StationError::InvalidConfig(
                "scanner.symbologies must enable at least one symbology".into(),
            ));
        }

        if self.scanner.workers == 0 {
            return Err(StationError::InvalidConfig(
                "scanner.workers must be greater than 0".into(),
            ));
        }

        if !(0..=MAX_QUANTITY).contains(&self.inventory.low_stock_threshold) {
            return Err(StationError::InvalidConfig(format!(
                "inventory.low_stock_threshold must be between 0 and {}",
                MAX_QUANTITY
            )));
        }

        if self.inventory.page_size == 0 || self.inventory.page_size > MAX_PAGE_SIZE {
            return Err(StationError::InvalidConfig(format!(
                "inventory.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("STOCKROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(cooldown) = var("STOCKROOM_COOLDOWN_MS") {
            match cooldown.trim().parse::<u64>() {
                Ok(ms) => self.scanner.cooldown_ms = ms,
                Err(_) => warn!(value = %cooldown, "Ignoring invalid STOCKROOM_COOLDOWN_MS"),
            }
        }

        if let Some(sound) = var("STOCKROOM_SOUND") {
            match sound.trim().to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.scanner.sound = true,
                "0" | "false" | "off" | "no" => self.scanner.sound = false,
                _ => warn!(value = %sound, "Ignoring invalid STOCKROOM_SOUND"),
            }
        }

        if let Some(threshold) = var("STOCKROOM_LOW_STOCK") {
            match threshold.trim().parse::<i64>() {
                Ok(t) => self.inventory.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring invalid STOCKROOM_LOW_STOCK"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("station.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Resolves the database file: `--db`, then config, then the data dir.
    pub fn database_path(&self, cli_override: Option<PathBuf>) -> StationResult<PathBuf> {
        cli_override
            .or_else(|| self.database.path.clone())
            .or_else(|| {
                directories::ProjectDirs::from("com", "stockroom", "stockroom")
                    .map(|dirs| dirs.data_dir().join("stockroom.db"))
            })
            .ok_or(StationError::NoDatabasePath)
    }

    /// Scan cooldown as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.scanner.cooldown_ms)
    }

    /// Decoder settings for the scan session.
    pub fn decoder(&self) -> DecoderConfig {
        DecoderConfig::default()
            .symbologies(self.scanner.symbologies.iter().copied())
            .workers(self.scanner.workers)
    }
}
