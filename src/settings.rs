//! Settings
//!
//! Runtime configuration for the `greengrocer` binary: command-line arguments, environment
//! variables and an optional `.env` file, plus the wiring that turns them into a catalog, a
//! promotion set and a [`CheckoutEngine`].

use std::{ffi::OsString, fs, io, path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    basket::{BasketEntry, BasketError, BasketRequest},
    catalog::{CatalogError, ConfigurableCatalog},
    checkout::CheckoutEngine,
    promotions::{DiscountStrategy, PromotionError, defaults::defaults},
    rules::{self, PromotionFactories, RuleError},
};

/// Errors raised while turning settings into runtime components.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A price table could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A promotion rule file could not be loaded.
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// A built-in promotion could not be constructed.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// The basket could not be resolved.
    #[error(transparent)]
    Basket(#[from] BasketError),

    /// A basket file could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A basket file could not be parsed.
    #[error(transparent)]
    Yaml(#[from] serde_norway::Error),
}

/// Output format for receipts and price listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,

    /// Pretty-printed JSON
    Json,
}

/// Greengrocer configuration
#[derive(Debug, Parser)]
#[command(name = "greengrocer", about = "Greengrocer basket pricing", long_about = None)]
pub struct Settings {
    /// YAML or JSON price table replacing the built-in prices
    #[arg(long, env = "GREENGROCER_PRICES", global = true)]
    pub prices: Option<PathBuf>,

    /// YAML or JSON price table applied on top of the base prices
    #[arg(long, env = "GREENGROCER_OVERRIDES", global = true)]
    pub price_overrides: Option<PathBuf>,

    /// YAML or JSON promotion rule file
    #[arg(long, env = "GREENGROCER_PROMOTIONS", global = true)]
    pub promotions: Option<PathBuf>,

    /// Skip the built-in promotions
    #[arg(long, global = true)]
    pub no_default_promotions: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Output format
    #[arg(long, value_enum, default_value_t, global = true)]
    pub format: OutputFormat,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a basket and print its receipt
    Checkout(CheckoutArgs),

    /// List every item with its current unit price
    Items,
}

/// Arguments for `checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Basket entries, e.g. `bananas=3 apple=1`
    #[arg(value_name = "ITEM=QTY", required_unless_present = "file")]
    pub entries: Vec<BasketEntry>,

    /// YAML or JSON basket file, e.g. `{ items: [ { item: bananas, quantity: 3 } ] }`
    #[arg(short, long, conflicts_with = "entries")]
    pub file: Option<PathBuf>,
}

impl CheckoutArgs {
    /// The unresolved basket request, from the file or the positional entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the basket file cannot be read or parsed.
    pub fn basket_request(&self) -> Result<BasketRequest, SettingsError> {
        let Some(path) = &self.file else {
            return Ok(BasketRequest {
                items: self.entries.clone(),
            });
        };

        let contents = fs::read_to_string(path)?;

        Ok(serde_norway::from_str(&contents)?)
    }
}

/// Keep the environment variables whose name and value are both valid Unicode.
///
/// Other entries can't name an item or hold a price and are skipped.
pub fn unicode_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                debug!(key = ?key, "skipping non-unicode environment variable");

                None
            }
        })
}

impl Settings {
    /// Load settings from the environment and command-line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Build the price catalog.
    ///
    /// `--prices` replaces the built-in table, `--price-overrides` is applied next and
    /// `GREENGROCER_PRICE_<ITEM>` variables from `vars` last.
    ///
    /// # Errors
    ///
    /// Returns an error if a price file or variable cannot be applied.
    pub fn build_catalog(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<ConfigurableCatalog, SettingsError> {
        let mut catalog = if let Some(path) = &self.prices {
            let mut catalog = ConfigurableCatalog::new();

            catalog.apply_file(path)?;

            catalog
        } else {
            ConfigurableCatalog::with_defaults()
        };

        if let Some(path) = &self.price_overrides {
            catalog.apply_file(path)?;
        }

        catalog.apply_env(vars)?;

        info!(prices = catalog.len(), "built price catalog");

        Ok(catalog)
    }

    /// Build the promotion set: the built-in promotions (unless disabled) followed by the
    /// configured rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any promotion fails to build. Nothing is returned for a partially
    /// valid rule file.
    pub fn build_strategies(&self) -> Result<Vec<Arc<dyn DiscountStrategy>>, SettingsError> {
        let mut strategies = if self.no_default_promotions {
            Vec::new()
        } else {
            defaults()?
        };

        if let Some(path) = &self.promotions {
            strategies.extend(rules::load_file(path, &PromotionFactories::with_defaults())?);
        }

        Ok(strategies)
    }

    /// Build a checkout engine from the catalog and promotion set.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or the promotion set cannot be built.
    pub fn build_engine(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<CheckoutEngine, SettingsError> {
        let catalog = self.build_catalog(vars)?;
        let strategies = self.build_strategies()?;
        let engine = CheckoutEngine::from_strategies(Arc::new(catalog), &strategies);

        info!(
            strategies = strategies.len(),
            basket_strategies = engine.basket_strategies().len(),
            "built checkout engine"
        );

        Ok(engine)
    }
}
