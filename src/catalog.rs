//! Price Catalog
//!
//! Unit prices per [`ItemType`]. [`StaticCatalog`] is the built-in table; [`ConfigurableCatalog`]
//! starts from any table and applies overrides from files or the environment, last write wins per
//! item. A checkout queries its catalog once per distinct item type through a [`PriceSnapshot`],
//! so every strategy in that checkout sees the same unit price.

use std::{collections::hash_map::Entry, fmt, fs, io, path::Path};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    items::{ItemType, UnknownItem},
    money::Money,
};

/// Environment variable prefix for per-item price overrides, e.g. `GREENGROCER_PRICE_APPLES=0.55`.
pub const PRICE_ENV_PREFIX: &str = "GREENGROCER_PRICE_";

/// Errors raised by price lookups and price configuration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No price is configured for the item type.
    #[error("Missing price for item: {0}")]
    MissingPrice(ItemType),

    /// A configured price was zero or negative.
    #[error("Invalid price {price} for item {item}; prices must be positive")]
    InvalidPrice {
        /// Item type
        item: ItemType,

        /// Rejected price
        price: Money,
    },

    /// A configured price was above [`Money::MAX_PRICE`].
    #[error("Price {price} for item {item} exceeds the maximum unit price of {max}", max = Money::MAX_PRICE)]
    PriceOutOfRange {
        /// Item type
        item: ItemType,

        /// Rejected price
        price: Money,
    },

    /// A configured price could not be parsed as a decimal.
    #[error("Invalid price '{value}' for {key}")]
    UnparsablePrice {
        /// Configuration key
        key: String,

        /// Raw value
        value: String,
    },

    /// A configuration key named no known item.
    #[error(transparent)]
    UnknownItem(#[from] UnknownItem),

    /// IO error reading a price file
    #[error("Failed to read price file: {0}")]
    Io(#[from] io::Error),

    /// YAML/JSON parsing error
    #[error("Failed to parse price file: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// A source of unit prices.
pub trait PriceSource: Send + Sync + fmt::Debug {
    /// Unit price of an item type.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingPrice`] if the item type has no configured price.
    fn price_of(&self, item_type: ItemType) -> Result<Money, CatalogError>;

    /// Every item type with its unit price, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingPrice`] for the first item type without a price.
    fn price_list(&self) -> Result<Vec<(ItemType, Money)>, CatalogError> {
        ItemType::ALL
            .into_iter()
            .map(|item_type| self.price_of(item_type).map(|price| (item_type, price)))
            .collect()
    }
}

/// The built-in price table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    /// Built-in unit price in minor units.
    const fn minor_units(item_type: ItemType) -> i64 {
        match item_type {
            ItemType::Bananas => 50,
            ItemType::Oranges => 30,
            ItemType::Apples => 60,
            ItemType::Lemons => 25,
            ItemType::Peaches => 75,
        }
    }
}

impl PriceSource for StaticCatalog {
    fn price_of(&self, item_type: ItemType) -> Result<Money, CatalogError> {
        Ok(Money::from_minor(Self::minor_units(item_type)))
    }
}

/// Price file layout: `prices: { ITEM: PRICE, ... }`.
///
/// Keys go through the item alias table, values may be numbers or strings.
#[derive(Debug, Default, Deserialize)]
pub struct PriceFile {
    /// Map of item -> unit price
    #[serde(default)]
    pub prices: FxHashMap<ItemType, Money>,
}

/// A price table built from defaults plus overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigurableCatalog {
    prices: FxHashMap<ItemType, Money>,
}

impl ConfigurableCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog seeded with the built-in table.
    pub fn with_defaults() -> Self {
        let prices = ItemType::ALL
            .into_iter()
            .map(|item_type| {
                (
                    item_type,
                    Money::from_minor(StaticCatalog::minor_units(item_type)),
                )
            })
            .collect();

        Self { prices }
    }

    /// Set the unit price of one item type, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPrice`] if `price` is not positive, or
    /// [`CatalogError::PriceOutOfRange`] if it exceeds [`Money::MAX_PRICE`].
    pub fn set(&mut self, item_type: ItemType, price: Money) -> Result<&mut Self, CatalogError> {
        check_price(item_type, price)?;

        if let Some(previous) = self.prices.insert(item_type, price) {
            debug!(item = %item_type, %previous, %price, "overriding unit price");
        }

        Ok(self)
    }

    /// Apply a set of overrides in order; later entries win.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError::InvalidPrice`] or [`CatalogError::PriceOutOfRange`].
    pub fn apply(
        &mut self,
        overrides: impl IntoIterator<Item = (ItemType, Money)>,
    ) -> Result<&mut Self, CatalogError> {
        for (item_type, price) in overrides {
            self.set(item_type, price)?;
        }

        Ok(self)
    }

    /// Parse a YAML or JSON price document and apply it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed, names an unknown item, or holds a price
    /// outside `0 < price <= Money::MAX_PRICE`.
    pub fn apply_str(&mut self, contents: &str) -> Result<&mut Self, CatalogError> {
        let file: PriceFile = serde_norway::from_str(contents)?;

        self.apply(file.prices)
    }

    /// Read a YAML or JSON price file and apply it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or applied (see [`Self::apply_str`]).
    pub fn apply_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        self.apply_str(&contents)?;

        info!(path = %path.display(), "applied price file");

        Ok(self)
    }

    /// Apply `GREENGROCER_PRICE_<ITEM>` overrides from a set of environment variables.
    ///
    /// Variables without the prefix are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a prefixed variable names an unknown item or holds an invalid price.
    pub fn apply_env(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<&mut Self, CatalogError> {
        for (key, value) in vars {
            let Some(item) = key.strip_prefix(PRICE_ENV_PREFIX) else {
                continue;
            };

            let item_type = ItemType::resolve(item)?;
            let price = value
                .parse::<Money>()
                .map_err(|_err| CatalogError::UnparsablePrice {
                    key: key.clone(),
                    value: value.clone(),
                })?;

            self.set(item_type, price)?;
        }

        Ok(self)
    }

    /// Number of item types with a configured price.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no prices are configured.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceSource for ConfigurableCatalog {
    fn price_of(&self, item_type: ItemType) -> Result<Money, CatalogError> {
        self.prices
            .get(&item_type)
            .copied()
            .ok_or(CatalogError::MissingPrice(item_type))
    }
}

/// Reject unit prices that are not positive or exceed [`Money::MAX_PRICE`].
fn check_price(item: ItemType, price: Money) -> Result<Money, CatalogError> {
    if !price.is_positive() {
        return Err(CatalogError::InvalidPrice { item, price });
    }

    if price > Money::MAX_PRICE {
        return Err(CatalogError::PriceOutOfRange { item, price });
    }

    Ok(price)
}

/// Unit prices captured once for the item types of a single checkout.
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    prices: FxHashMap<ItemType, Money>,
}

impl PriceSnapshot {
    /// Query `source` once for each of `item_types`.
    ///
    /// Prices from any source are held to the same range as configured ones.
    ///
    /// # Errors
    ///
    /// Returns the first lookup error, typically [`CatalogError::MissingPrice`], or
    /// [`CatalogError::PriceOutOfRange`] if the source reports a price above
    /// [`Money::MAX_PRICE`].
    pub fn capture(
        source: &dyn PriceSource,
        item_types: impl IntoIterator<Item = ItemType>,
    ) -> Result<Self, CatalogError> {
        let mut prices = FxHashMap::default();

        for item_type in item_types {
            if let Entry::Vacant(entry) = prices.entry(item_type) {
                entry.insert(check_price(item_type, source.price_of(item_type)?)?);
            }
        }

        Ok(Self { prices })
    }
}

impl PriceSource for PriceSnapshot {
    fn price_of(&self, item_type: ItemType) -> Result<Money, CatalogError> {
        self.prices
            .get(&item_type)
            .copied()
            .ok_or(CatalogError::MissingPrice(item_type))
    }
}

/// One row of the item listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListEntry {
    /// Item type
    pub item_type: ItemType,

    /// Current unit price
    pub unit_price: Money,
}

impl From<(ItemType, Money)> for PriceListEntry {
    fn from((item_type, unit_price): (ItemType, Money)) -> Self {
        Self {
            item_type,
            unit_price,
        }
    }
}

/// Render a price listing as a table.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_price_list(mut out: impl io::Write, entries: &[PriceListEntry]) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Unit Price"]);

    for entry in entries {
        builder.push_record([
            entry.item_type.display_name().to_string(),
            format!("£{}", entry.unit_price),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::last(), Alignment::right());

    writeln!(out, "\n{table}\n")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn static_catalog_has_default_prices() -> Result<(), CatalogError> {
        let catalog = StaticCatalog;

        assert_eq!(catalog.price_of(ItemType::Bananas)?, Money::from_minor(50));
        assert_eq!(catalog.price_of(ItemType::Oranges)?, Money::from_minor(30));
        assert_eq!(catalog.price_of(ItemType::Apples)?, Money::from_minor(60));
        assert_eq!(catalog.price_of(ItemType::Lemons)?, Money::from_minor(25));
        assert_eq!(catalog.price_of(ItemType::Peaches)?, Money::from_minor(75));

        Ok(())
    }

    #[test]
    fn empty_catalog_reports_missing_price() {
        let catalog = ConfigurableCatalog::new();

        assert!(matches!(
            catalog.price_of(ItemType::Lemons),
            Err(CatalogError::MissingPrice(ItemType::Lemons))
        ));
    }

    #[test]
    fn overrides_are_last_write_wins() -> Result<(), CatalogError> {
        let mut catalog = ConfigurableCatalog::with_defaults();

        catalog.apply([
            (ItemType::Apples, Money::from_minor(70)),
            (ItemType::Apples, Money::from_minor(65)),
        ])?;

        assert_eq!(catalog.price_of(ItemType::Apples)?, Money::from_minor(65));
        assert_eq!(catalog.price_of(ItemType::Bananas)?, Money::from_minor(50));

        Ok(())
    }

    #[test]
    fn rejects_non_positive_prices() {
        let mut catalog = ConfigurableCatalog::new();

        let result = catalog.set(ItemType::Apples, Money::ZERO);

        assert!(matches!(
            result,
            Err(CatalogError::InvalidPrice {
                item: ItemType::Apples,
                ..
            })
        ));
    }

    #[test]
    fn rejects_prices_above_the_maximum() -> anyhow::Result<()> {
        let mut catalog = ConfigurableCatalog::with_defaults();

        let result = catalog.set(ItemType::Bananas, "100000000000000000000".parse()?);

        assert!(matches!(
            result,
            Err(CatalogError::PriceOutOfRange {
                item: ItemType::Bananas,
                ..
            })
        ));
        assert_eq!(catalog.price_of(ItemType::Bananas)?, Money::from_minor(50));

        catalog.set(ItemType::Bananas, Money::MAX_PRICE)?;

        assert_eq!(catalog.price_of(ItemType::Bananas)?, Money::MAX_PRICE);

        Ok(())
    }

    #[test]
    fn price_document_above_the_maximum_fails() {
        let mut catalog = ConfigurableCatalog::new();

        let result = catalog.apply_str("prices:\n  BANANAS: \"100000000000000000000\"\n");

        assert!(matches!(
            result,
            Err(CatalogError::PriceOutOfRange { .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn applies_yaml_price_document() -> Result<(), CatalogError> {
        let mut catalog = ConfigurableCatalog::with_defaults();

        catalog.apply_str(
            r#"
prices:
  apple: 0.45
  PEACHES: "0.80"
"#,
        )?;

        assert_eq!(catalog.price_of(ItemType::Apples)?, Money::from_minor(45));
        assert_eq!(catalog.price_of(ItemType::Peaches)?, Money::from_minor(80));
        assert_eq!(catalog.len(), 5);

        Ok(())
    }

    #[test]
    fn applies_json_price_document() -> Result<(), CatalogError> {
        let mut catalog = ConfigurableCatalog::new();

        catalog.apply_str(r#"{ "prices": { "LEMONS": 0.3 } }"#)?;

        assert_eq!(catalog.price_of(ItemType::Lemons)?, Money::from_minor(30));
        assert_eq!(catalog.len(), 1);

        Ok(())
    }

    #[test]
    fn price_document_with_unknown_item_fails() {
        let mut catalog = ConfigurableCatalog::new();

        let result = catalog.apply_str("prices:\n  kiwi: 0.10\n");

        assert!(matches!(result, Err(CatalogError::Yaml(_))));
    }

    #[test]
    fn applies_prefixed_environment_overrides() -> Result<(), CatalogError> {
        let mut catalog = ConfigurableCatalog::with_defaults();

        catalog.apply_env([
            ("PATH".to_string(), "/usr/bin".to_string()),
            (format!("{PRICE_ENV_PREFIX}ORANGES"), "0.35".to_string()),
        ])?;

        assert_eq!(catalog.price_of(ItemType::Oranges)?, Money::from_minor(35));

        Ok(())
    }

    #[test]
    fn unparsable_environment_price_fails() {
        let mut catalog = ConfigurableCatalog::with_defaults();

        let result = catalog.apply_env([(
            format!("{PRICE_ENV_PREFIX}APPLES"),
            "cheap".to_string(),
        )]);

        assert!(matches!(result, Err(CatalogError::UnparsablePrice { .. })));
    }

    #[test]
    fn price_list_is_in_declaration_order() -> Result<(), CatalogError> {
        let list = StaticCatalog.price_list()?;
        let types: Vec<_> = list.iter().map(|(item_type, _)| *item_type).collect();

        assert_eq!(types, ItemType::ALL.to_vec());

        Ok(())
    }

    #[test]
    fn price_list_fails_on_missing_price() -> Result<(), CatalogError> {
        let mut catalog = ConfigurableCatalog::new();
        catalog.set(ItemType::Bananas, Money::from_minor(50))?;

        assert!(matches!(
            catalog.price_list(),
            Err(CatalogError::MissingPrice(ItemType::Oranges))
        ));

        Ok(())
    }

    #[derive(Debug, Default)]
    struct CountingSource {
        lookups: AtomicUsize,
    }

    impl PriceSource for CountingSource {
        fn price_of(&self, item_type: ItemType) -> Result<Money, CatalogError> {
            self.lookups.fetch_add(1, Ordering::Relaxed);

            StaticCatalog.price_of(item_type)
        }
    }

    #[test]
    fn snapshot_queries_each_item_type_once() -> Result<(), CatalogError> {
        let source = CountingSource::default();

        let snapshot = PriceSnapshot::capture(
            &source,
            [ItemType::Apples, ItemType::Apples, ItemType::Lemons],
        )?;

        assert_eq!(source.lookups.load(Ordering::Relaxed), 2);
        assert_eq!(snapshot.price_of(ItemType::Apples)?, Money::from_minor(60));
        assert!(matches!(
            snapshot.price_of(ItemType::Peaches),
            Err(CatalogError::MissingPrice(ItemType::Peaches))
        ));

        Ok(())
    }

    #[derive(Debug)]
    struct FixedSource(Money);

    impl PriceSource for FixedSource {
        fn price_of(&self, _item_type: ItemType) -> Result<Money, CatalogError> {
            Ok(self.0)
        }
    }

    #[test]
    fn snapshot_rejects_out_of_range_source_prices() -> anyhow::Result<()> {
        let source = FixedSource("100000000000000000000".parse()?);

        assert!(matches!(
            PriceSnapshot::capture(&source, [ItemType::Bananas]),
            Err(CatalogError::PriceOutOfRange {
                item: ItemType::Bananas,
                ..
            })
        ));
        assert!(matches!(
            PriceSnapshot::capture(&FixedSource(Money::ZERO), [ItemType::Lemons]),
            Err(CatalogError::InvalidPrice { .. })
        ));

        Ok(())
    }

    #[test]
    fn price_list_renders_as_table() -> anyhow::Result<()> {
        let entries: Vec<PriceListEntry> = StaticCatalog
            .price_list()?
            .into_iter()
            .map(PriceListEntry::from)
            .collect();
        let mut out = Vec::new();

        write_price_list(&mut out, &entries)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("bananas"));
        assert!(output.contains("£0.75"));

        Ok(())
    }

    #[test]
    fn price_list_entry_serializes_camel_case() -> anyhow::Result<()> {
        let entry = PriceListEntry::from((ItemType::Apples, Money::from_minor(60)));

        assert_eq!(
            serde_json::to_string(&entry)?,
            r#"{"itemType":"APPLES","unitPrice":"0.60"}"#
        );

        Ok(())
    }
}
