use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, MedicineId, MovementId};

/// Reference to a catalog medicine as embedded in ledger and lot records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRef {
    pub id: MedicineId,
    pub name: Option<String>,
    pub code: Option<String>,
}

impl MedicineRef {
    pub fn new(id: MedicineId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            code: None,
        }
    }

    /// Reference carrying only the identifier (name not loaded).
    pub fn bare(id: MedicineId) -> Self {
        Self {
            id,
            name: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Name if present and not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Categorical tag on a stock ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    Sale,
    Purchase,
    Adjustment,
    Refund,
    Transfer,
    Expiry,
}

impl MovementType {
    pub const ALL: [MovementType; 6] = [
        MovementType::Sale,
        MovementType::Purchase,
        MovementType::Adjustment,
        MovementType::Refund,
        MovementType::Transfer,
        MovementType::Expiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "Sale",
            MovementType::Purchase => "Purchase",
            MovementType::Adjustment => "Adjustment",
            MovementType::Refund => "Refund",
            MovementType::Transfer => "Transfer",
            MovementType::Expiry => "Expiry",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MovementType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::validation(format!("unknown movement type: {s}")))
    }
}

/// One immutable stock ledger entry, as served by the backend.
///
/// `quantity` is a signed delta: positive entries add stock (purchase,
/// refund to stock, positive adjustment), negative entries remove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub medicine: MedicineRef,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub stock_before: Option<i64>,
    pub stock_after: Option<i64>,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn is_inbound(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_outbound(&self) -> bool {
        self.quantity < 0
    }

    /// `"{type} #{id}"` when both reference parts are present.
    pub fn reference_label(&self) -> Option<String> {
        match (self.reference_type.as_deref(), self.reference_id) {
            (Some(kind), Some(id)) if !kind.is_empty() => Some(format!("{kind} #{id}")),
            _ => None,
        }
    }

    /// Signed quantity with an explicit `+` for stock increases.
    pub fn signed_quantity(&self) -> String {
        if self.quantity > 0 {
            format!("+{}", self.quantity)
        } else {
            self.quantity.to_string()
        }
    }
}
