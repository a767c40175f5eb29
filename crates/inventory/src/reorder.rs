//! Reorder levels: per-medicine stock bounds and replenishment suggestions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, DomainResult, MedicineId};

use crate::movement::MedicineRef;
use crate::valuation::{MedicineStockRow, UNKNOWN_MEDICINE};

/// Configured minimum/maximum stock and replenishment quantity for a medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderLevel {
    pub medicine: MedicineRef,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    pub reorder_quantity: i64,
    #[serde(default)]
    pub auto_reorder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderStatus {
    OutOfStock,
    Low,
    Ok,
    Overstocked,
}

impl ReorderStatus {
    pub fn needs_reorder(&self) -> bool {
        matches!(self, ReorderStatus::OutOfStock | ReorderStatus::Low)
    }
}

impl ReorderLevel {
    pub fn validate(&self) -> DomainResult<()> {
        if self.min_stock < 0 {
            return Err(DomainError::validation("minimum stock cannot be negative"));
        }
        if let Some(max) = self.max_stock {
            if max < self.min_stock {
                return Err(DomainError::validation(
                    "maximum stock must be at least the minimum stock",
                ));
            }
        }
        if self.reorder_quantity <= 0 {
            return Err(DomainError::validation("reorder quantity must be positive"));
        }
        Ok(())
    }

    pub fn status(&self, on_hand: i64) -> ReorderStatus {
        if on_hand <= 0 {
            ReorderStatus::OutOfStock
        } else if on_hand <= self.min_stock {
            ReorderStatus::Low
        } else if self.max_stock.is_some_and(|max| on_hand > max) {
            ReorderStatus::Overstocked
        } else {
            ReorderStatus::Ok
        }
    }

    /// Quantity to order now; zero above the minimum. Capped by `max_stock`.
    pub fn suggested_quantity(&self, on_hand: i64) -> i64 {
        if !self.status(on_hand).needs_reorder() {
            return 0;
        }
        match self.max_stock {
            Some(max) => self.reorder_quantity.min(max - on_hand.max(0)).max(0),
            None => self.reorder_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub on_hand: i64,
    pub status: ReorderStatus,
    pub suggested_quantity: i64,
    pub auto_reorder: bool,
}

/// Medicines at or below their minimum stock.
///
/// Stocked medicines come first in `rows` order, followed by configured
/// medicines with no lots at all, in `levels` order.
pub fn reorder_report(rows: &[MedicineStockRow], levels: &[ReorderLevel]) -> Vec<ReorderSuggestion> {
    let by_medicine: HashMap<MedicineId, &ReorderLevel> =
        levels.iter().map(|l| (l.medicine.id, l)).collect();
    let stocked: HashSet<MedicineId> = rows.iter().map(|r| r.medicine_id).collect();

    let from_rows = rows.iter().filter_map(|row| {
        let level = by_medicine.get(&row.medicine_id)?;
        suggestion(level, row.total_quantity, Some(&row.medicine_name))
    });

    let unstocked = levels
        .iter()
        .filter(|l| !stocked.contains(&l.medicine.id))
        .filter_map(|l| suggestion(l, 0, None));

    from_rows.chain(unstocked).collect()
}

fn suggestion(level: &ReorderLevel, on_hand: i64, row_name: Option<&str>) -> Option<ReorderSuggestion> {
    let status = level.status(on_hand);
    if !status.needs_reorder() {
        return None;
    }

    let medicine_name = row_name
        .filter(|n| *n != UNKNOWN_MEDICINE)
        .or_else(|| level.medicine.display_name())
        .unwrap_or(UNKNOWN_MEDICINE)
        .to_string();

    Some(ReorderSuggestion {
        medicine_id: level.medicine.id,
        medicine_name,
        on_hand,
        status,
        suggested_quantity: level.suggested_quantity(on_hand),
        auto_reorder: level.auto_reorder,
    })
}
