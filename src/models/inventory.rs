//! Consumable inventory models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A consumable stock item (toner, cables, spare parts)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub campus: String,
    pub quantity: i32,
    pub unit: Option<String>,
    /// Reorder threshold
    pub min_quantity: Option<i32>,
}

/// A stock movement; the transaction list is capped in local storage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryTransaction {
    pub id: i64,
    pub item_id: i64,
    pub date: Option<NaiveDate>,
    /// Signed quantity change
    pub delta: i32,
    pub actor: Option<String>,
    pub note: Option<String>,
}
