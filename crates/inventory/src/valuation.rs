//! Stock valuation and per-medicine grouping.
//!
//! Values are `quantity × price` over on-hand stock. Negative quantities are
//! not expected from the backend but propagate arithmetically if present.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, DomainResult, MedicineId};

use crate::lot::StockLot;

/// Display name for a medicine group when no lot carries a name.
pub const UNKNOWN_MEDICINE: &str = "Unknown";

/// Aggregate valuation over a set of lots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockValuation {
    pub cost_value: Decimal,
    pub selling_value: Decimal,
    /// Selling value minus cost value, assuming full liquidation.
    pub potential_profit: Decimal,
}

pub fn compute_valuation(lots: &[StockLot]) -> StockValuation {
    let (cost_value, selling_value) = lots.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(cost, selling), lot| {
            (
                cost.saturating_add(lot.cost_value()),
                selling.saturating_add(lot.selling_value()),
            )
        },
    );

    StockValuation {
        cost_value,
        selling_value,
        potential_profit: selling_value.saturating_sub(cost_value),
    }
}

/// Stock report row: all lots of one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineStockRow {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub total_quantity: i64,
    pub batch_count: usize,
    pub total_cost_value: Decimal,
    pub total_selling_value: Decimal,
}

impl MedicineStockRow {
    fn empty(medicine_id: MedicineId) -> Self {
        Self {
            medicine_id,
            medicine_name: String::new(),
            total_quantity: 0,
            batch_count: 0,
            total_cost_value: Decimal::ZERO,
            total_selling_value: Decimal::ZERO,
        }
    }

    pub fn potential_profit(&self) -> Decimal {
        self.total_selling_value.saturating_sub(self.total_cost_value)
    }
}

/// Group lots by medicine id, emitting groups in first-seen order.
pub fn group_by_medicine(lots: &[StockLot]) -> Vec<MedicineStockRow> {
    let mut index: HashMap<MedicineId, usize> = HashMap::new();
    let mut rows: Vec<MedicineStockRow> = Vec::new();

    for lot in lots {
        let slot = *index.entry(lot.medicine.id).or_insert_with(|| {
            rows.push(MedicineStockRow::empty(lot.medicine.id));
            rows.len() - 1
        });

        let row = &mut rows[slot];
        if row.medicine_name.is_empty() {
            if let Some(name) = lot.medicine.display_name() {
                row.medicine_name = name.to_string();
            }
        }
        row.total_quantity = row.total_quantity.saturating_add(lot.quantity);
        row.batch_count += 1;
        row.total_cost_value = row.total_cost_value.saturating_add(lot.cost_value());
        row.total_selling_value = row.total_selling_value.saturating_add(lot.selling_value());
    }

    for row in &mut rows {
        if row.medicine_name.is_empty() {
            row.medicine_name = UNKNOWN_MEDICINE.to_string();
        }
    }

    rows
}

/// Pricing defaults applied when receiving stock without an explicit
/// selling price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    default_markup: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            default_markup: Decimal::new(15, 1),
        }
    }
}

impl PricingPolicy {
    pub fn new(default_markup: Decimal) -> DomainResult<Self> {
        if default_markup <= Decimal::ZERO {
            return Err(DomainError::validation("markup must be positive"));
        }
        Ok(Self { default_markup })
    }

    pub fn default_markup(&self) -> Decimal {
        self.default_markup
    }

    /// `cost × markup`, rounded to cents.
    pub fn default_selling_price(&self, cost_price: Decimal) -> Decimal {
        (cost_price * self.default_markup).round_dp(2)
    }
}
