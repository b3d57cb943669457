//! Basket

use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::items::{ItemType, UnknownItem};

/// Errors related to basket construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BasketError {
    /// An item identifier did not resolve to any item type.
    #[error(transparent)]
    UnknownItem(#[from] UnknownItem),

    /// A quantity was zero, negative or out of range.
    #[error("Invalid quantity {quantity} for item {item}")]
    InvalidQuantity {
        /// Item identifier as given
        item: String,

        /// Rejected quantity
        quantity: i64,
    },

    /// A basket entry could not be parsed from text.
    #[error("Invalid basket entry '{0}', expected ITEM=QUANTITY")]
    InvalidEntry(String),

    /// The request contained no entries.
    #[error("Basket request contains no items")]
    Empty,
}

/// A single basket line: an item type and a positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasketItem {
    item_type: ItemType,
    quantity: u32,
}

impl BasketItem {
    /// Create a basket item.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::InvalidQuantity`] if `quantity` is zero.
    pub fn new(item_type: ItemType, quantity: u32) -> Result<Self, BasketError> {
        if quantity == 0 {
            return Err(BasketError::InvalidQuantity {
                item: item_type.name().to_string(),
                quantity: 0,
            });
        }

        Ok(Self {
            item_type,
            quantity,
        })
    }

    /// Return the item type.
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Return the quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Basket
///
/// An ordered list of basket items. Input order is preserved and the same item type may appear
/// more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Basket {
    items: Vec<BasketItem>,
}

impl Basket {
    /// Create an empty basket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a basket from already validated items.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::InvalidQuantity`] if the summed quantity of any item type exceeds
    /// `u32::MAX`.
    pub fn with_items(items: impl IntoIterator<Item = BasketItem>) -> Result<Self, BasketError> {
        let mut basket = Self::new();

        for item in items {
            basket.push_item(item)?;
        }

        Ok(basket)
    }

    /// Add an item to the basket.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::InvalidQuantity`] if `quantity` is zero, or if it would take the
    /// summed quantity of `item_type` past `u32::MAX`.
    pub fn push(&mut self, item_type: ItemType, quantity: u32) -> Result<&mut Self, BasketError> {
        self.push_item(BasketItem::new(item_type, quantity)?)
    }

    /// Add a validated item, keeping every per-type total representable as a `u32`.
    fn push_item(&mut self, item: BasketItem) -> Result<&mut Self, BasketError> {
        let existing = self.quantity_of(item.item_type);

        if existing.checked_add(item.quantity).is_none() {
            return Err(BasketError::InvalidQuantity {
                item: item.item_type.name().to_string(),
                quantity: i64::from(existing) + i64::from(item.quantity),
            });
        }

        self.items.push(item);

        Ok(self)
    }

    /// Get the basket items in input order.
    pub fn items(&self) -> &[BasketItem] {
        &self.items
    }

    /// Iterate the basket items in input order.
    pub fn iter(&self) -> impl Iterator<Item = &BasketItem> {
        self.items.iter()
    }

    /// Get the number of basket lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the basket is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total quantity of an item type across all basket lines.
    ///
    /// Per-type totals are checked on insertion, so the sum never saturates.
    pub fn quantity_of(&self, item_type: ItemType) -> u32 {
        self.items
            .iter()
            .filter(|item| item.item_type == item_type)
            .fold(0, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Total quantity per item type.
    pub fn quantities(&self) -> FxHashMap<ItemType, u32> {
        let mut counts = FxHashMap::default();

        for item in &self.items {
            let count = counts.entry(item.item_type).or_insert(0u32);
            *count = count.saturating_add(item.quantity);
        }

        counts
    }

    /// Distinct item types present in the basket, in item-type declaration order.
    pub fn item_types(&self) -> SmallVec<[ItemType; 5]> {
        ItemType::ALL
            .into_iter()
            .filter(|item_type| self.items.iter().any(|item| item.item_type == *item_type))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Basket {
    type Item = &'a BasketItem;
    type IntoIter = std::slice::Iter<'a, BasketItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An unresolved basket entry, as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BasketEntry {
    /// Item identifier (case-insensitive, singular or plural)
    pub item: String,

    /// Requested quantity
    pub quantity: i64,
}

impl BasketEntry {
    /// Resolve this entry into a basket item.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::UnknownItem`] if the identifier doesn't resolve, or
    /// [`BasketError::InvalidQuantity`] if the quantity isn't a positive `u32`.
    pub fn resolve(&self) -> Result<BasketItem, BasketError> {
        let item_type = ItemType::resolve(&self.item)?;

        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or_else(|| BasketError::InvalidQuantity {
                item: self.item.clone(),
                quantity: self.quantity,
            })?;

        BasketItem::new(item_type, quantity)
    }
}

impl FromStr for BasketEntry {
    type Err = BasketError;

    /// Parse `ITEM=QUANTITY` (or `ITEM:QUANTITY`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (item, quantity) = s
            .split_once(['=', ':'])
            .ok_or_else(|| BasketError::InvalidEntry(s.to_string()))?;

        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|_err| BasketError::InvalidEntry(s.to_string()))?;

        Ok(BasketEntry {
            item: item.trim().to_string(),
            quantity,
        })
    }
}

/// A checkout request: an ordered list of unresolved entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BasketRequest {
    /// Entries in input order
    pub items: Vec<BasketEntry>,
}

impl BasketRequest {
    /// Resolve every entry into a [`Basket`].
    ///
    /// Resolution is all-or-nothing: the first entry that fails rejects the whole request.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::Empty`] for a request without entries, otherwise the first entry's
    /// resolution error, or [`BasketError::InvalidQuantity`] if the entries for one item type add
    /// up to more than `u32::MAX`.
    pub fn resolve(&self) -> Result<Basket, BasketError> {
        if self.items.is_empty() {
            return Err(BasketError::Empty);
        }

        let items = self
            .items
            .iter()
            .map(BasketEntry::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        Basket::with_items(items)
    }
}

impl TryFrom<&BasketRequest> for Basket {
    type Error = BasketError;

    fn try_from(request: &BasketRequest) -> Result<Self, Self::Error> {
        request.resolve()
    }
}
