use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::LotId;

use crate::expiry::days_until_expiry;
use crate::movement::MedicineRef;

/// Lifecycle state of a received batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotStatus {
    Active,
    Depleted,
    Expired,
    Recalled,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Active => "active",
            LotStatus::Depleted => "depleted",
            LotStatus::Expired => "expired",
            LotStatus::Recalled => "recalled",
        }
    }
}

/// One receiving batch of a medicine (read-only snapshot from the backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: LotId,
    pub medicine: MedicineRef,
    pub batch_number: String,
    pub quantity: i64,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub expiry_date: NaiveDate,
    pub status: LotStatus,
}

/// Lot values saturate at the `Decimal` range instead of panicking on
/// out-of-range backend data.
impl StockLot {
    pub fn cost_value(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.cost_price)
    }

    pub fn selling_value(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.selling_price)
    }
}

/// A lot close to (or past) its expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringLot {
    #[serde(flatten)]
    pub lot: StockLot,
    #[serde(default, alias = "days_until_expiry")]
    pub days_remaining: i64,
}

impl ExpiringLot {
    pub fn from_lot(lot: StockLot, as_of: DateTime<Utc>) -> Self {
        let days_remaining = days_until_expiry(lot.expiry_date, as_of);
        Self {
            lot,
            days_remaining,
        }
    }

    /// Recompute `days_remaining` against a new reference instant.
    pub fn refreshed(mut self, as_of: DateTime<Utc>) -> Self {
        self.days_remaining = days_until_expiry(self.lot.expiry_date, as_of);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.days_remaining < 0
    }
}
