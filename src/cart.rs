//! Cart document types and the line-item aggregation rule
use std::collections::HashSet;

use crate::error::CartError;

// Amounts are integer minor currency units.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    minicbor::Encode,
    minicbor::Decode,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[n(0)]
    pub item_id: String,
    #[n(1)]
    pub qty: u32,
    #[n(2)]
    pub price: u64,
    #[n(3)]
    pub total: u64, // price * qty
}

/// The private state of one cart instance.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    minicbor::Encode,
    minicbor::Decode,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    #[n(0)]
    pub items: Vec<LineItem>, // insertion order, unique by item_id
    #[n(1)]
    pub total_sum: u64,
}

impl LineItem {
    pub fn new(item_id: impl Into<String>, qty: u32, price: u64) -> Result<Self, CartError> {
        Ok(Self {
            item_id: item_id.into(),
            qty,
            price,
            total: line_total(qty, price)?,
        })
    }
}

pub fn line_total(qty: u32, price: u64) -> Result<u64, CartError> {
    price
        .checked_mul(u64::from(qty))
        .ok_or(CartError::ArithmeticOverflow("line item total"))
}

impl StateDocument {
    /// The zero document: no items and a total of zero.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.total_sum == 0
    }

    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.item_id == item_id)
    }

    /// Folds a line-item delta into the document.
    ///
    /// An existing item with the same id has its qty, price and total
    /// replaced in place, otherwise a new item is appended. `total_sum` is
    /// then recomputed over every item. On error the document is unchanged.
    pub fn apply_update(&mut self, item_id: &str, qty: u32, price: u64) -> Result<(), CartError> {
        let total = line_total(qty, price)?;

        let total_sum = self
            .items
            .iter()
            .filter(|item| item.item_id != item_id)
            .try_fold(total, |acc, item| acc.checked_add(item.total))
            .ok_or(CartError::ArithmeticOverflow("cart total"))?;

        match self.items.iter_mut().find(|item| item.item_id == item_id) {
            Some(item) => {
                item.qty = qty;
                item.price = price;
                item.total = total;
            }
            None => self.items.push(LineItem {
                item_id: item_id.to_string(),
                qty,
                price,
                total,
            }),
        }
        self.total_sum = total_sum;

        Ok(())
    }

    /// Sum of all item totals, recomputed from scratch.
    pub fn computed_total(&self) -> Result<u64, CartError> {
        self.items
            .iter()
            .try_fold(0u64, |acc, item| acc.checked_add(item.total))
            .ok_or(CartError::ArithmeticOverflow("cart total"))
    }

    /// Checks the document invariants: unique item ids, every item total
    /// equal to price * qty, and `total_sum` equal to the sum of item totals.
    pub fn validate(&self) -> Result<(), CartError> {
        let mut seen = HashSet::with_capacity(self.items.len());

        for item in &self.items {
            if item.item_id.is_empty() {
                return Err(CartError::InconsistentDocument("item with empty itemId".into()));
            }
            if !seen.insert(item.item_id.as_str()) {
                return Err(CartError::InconsistentDocument(format!(
                    "duplicate itemId {}",
                    item.item_id
                )));
            }
            let expected = line_total(item.qty, item.price)?;
            if item.total != expected {
                return Err(CartError::InconsistentDocument(format!(
                    "item {} has total {}, expected {}",
                    item.item_id, item.total, expected
                )));
            }
        }

        let expected = self.computed_total()?;
        if self.total_sum != expected {
            return Err(CartError::InconsistentDocument(format!(
                "totalSum is {}, items add up to {}",
                self.total_sum, expected
            )));
        }

        Ok(())
    }

    /// Resets to the zero document.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total_sum = 0;
    }
}
