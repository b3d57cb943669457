//! Items
//!
//! The closed set of purchasable goods, and resolution of external item identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// An item identifier that does not resolve to any [`ItemType`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown item: {0}")]
pub struct UnknownItem(pub String);

/// A purchasable item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemType {
    /// Bananas
    Bananas,

    /// Oranges
    Oranges,

    /// Apples
    Apples,

    /// Lemons
    Lemons,

    /// Peaches
    Peaches,
}

impl ItemType {
    /// Every item type, in declaration order.
    pub const ALL: [ItemType; 5] = [
        ItemType::Bananas,
        ItemType::Oranges,
        ItemType::Apples,
        ItemType::Lemons,
        ItemType::Peaches,
    ];

    /// Canonical upper-case name, e.g. `BANANAS`.
    pub const fn name(self) -> &'static str {
        match self {
            ItemType::Bananas => "BANANAS",
            ItemType::Oranges => "ORANGES",
            ItemType::Apples => "APPLES",
            ItemType::Lemons => "LEMONS",
            ItemType::Peaches => "PEACHES",
        }
    }

    /// Lower-case name used on receipt lines, e.g. `bananas`.
    pub const fn display_name(self) -> &'static str {
        match self {
            ItemType::Bananas => "bananas",
            ItemType::Oranges => "oranges",
            ItemType::Apples => "apples",
            ItemType::Lemons => "lemons",
            ItemType::Peaches => "peaches",
        }
    }

    /// Resolve an external identifier.
    ///
    /// Matching is case-insensitive, ignores surrounding whitespace and accepts both the singular
    /// and plural spelling (`"Apple"`, `"apples"` and `"APPLES"` all resolve to
    /// [`ItemType::Apples`]).
    ///
    /// # Errors
    ///
    /// Returns [`UnknownItem`] when the identifier matches no item type.
    pub fn resolve(input: &str) -> Result<Self, UnknownItem> {
        match input.trim().to_ascii_lowercase().as_str() {
            "banana" | "bananas" => Ok(ItemType::Bananas),
            "orange" | "oranges" => Ok(ItemType::Oranges),
            "apple" | "apples" => Ok(ItemType::Apples),
            "lemon" | "lemons" => Ok(ItemType::Lemons),
            "peach" | "peaches" => Ok(ItemType::Peaches),
            _ => Err(UnknownItem(input.to_string())),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemType {
    type Err = UnknownItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::resolve(s)
    }
}

impl Serialize for ItemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ItemType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        ItemType::resolve(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_singular_and_plural_aliases() -> Result<(), UnknownItem> {
        assert_eq!(ItemType::resolve("apple")?, ItemType::Apples);
        assert_eq!(ItemType::resolve("Apples")?, ItemType::Apples);
        assert_eq!(ItemType::resolve("  PEACH ")?, ItemType::Peaches);
        assert_eq!(ItemType::resolve("peaches")?, ItemType::Peaches);
        assert_eq!(ItemType::resolve("Bananas")?, ItemType::Bananas);

        Ok(())
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let result = ItemType::resolve("kiwi");

        assert_eq!(result, Err(UnknownItem("kiwi".to_string())));
    }

    #[test]
    fn every_canonical_name_round_trips() -> Result<(), UnknownItem> {
        for item in ItemType::ALL {
            assert_eq!(ItemType::resolve(item.name())?, item);
            assert_eq!(item.display_name(), item.name().to_ascii_lowercase());
        }

        Ok(())
    }

    #[test]
    fn deserializes_through_aliases() -> anyhow::Result<()> {
        let item: ItemType = serde_json::from_str("\"Lemon\"")?;

        assert_eq!(item, ItemType::Lemons);
        assert!(serde_json::from_str::<ItemType>("\"grape\"").is_err());

        Ok(())
    }
}
