//! Application configuration management.

use serde::Deserialize;

use crate::types::TaxRates;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database configuration; absent when the ledger runs purely in memory.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Budget ledger and change-order settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Invoice tax rates.
    #[serde(default)]
    pub tax: TaxRates,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Budget ledger settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Prefix of change-order numbers (`CO` in `CO-001`).
    #[serde(default = "default_change_order_prefix")]
    pub change_order_prefix: String,
    /// Minimum number of digits in a change-order number.
    #[serde(default = "default_number_width")]
    pub number_width: usize,
    /// Optional JSON file holding the division taxonomy.
    ///
    /// When unset the built-in MasterFormat division list is used.
    #[serde(default)]
    pub taxonomy_path: Option<String>,
}

fn default_change_order_prefix() -> String {
    "CO".to_string()
}

fn default_number_width() -> usize {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            change_order_prefix: default_change_order_prefix(),
            number_width: default_number_width(),
            taxonomy_path: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Binaries log under their own target, library crates under theirs.
fn default_log_filter() -> String {
    "seeder=info,migrator=info,chantier_core=info,chantier_db=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `CHANTIER__SECTION__KEY` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CHANTIER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
