//! Strongly-typed identifiers used across the domain.
//!
//! The backend hands out positive integer keys; these newtypes keep a
//! medicine id from being passed where a sale id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a medicine (catalog entry).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicineId(i64);

/// Identifier of a stock ledger entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(i64);

/// Identifier of a received stock lot (batch).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(i64);

/// Identifier of a sale (invoice header).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(i64);

/// Identifier of one line of a sale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleItemId(i64);

/// Identifier of a purchase order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw key without validation (trusted backend data, tests).
            pub const fn from_raw(value: i64) -> Self {
                Self(value)
            }

            /// Wrap a user-supplied key; it must be a positive integer.
            pub fn try_new(value: i64) -> Result<Self, DomainError> {
                if value <= 0 {
                    return Err(DomainError::invalid_id(format!(
                        "{}: must be positive, got {}",
                        $name, value
                    )));
                }
                Ok(Self(value))
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::try_new(raw)
            }
        }
    };
}

impl_int_newtype!(MedicineId, "MedicineId");
impl_int_newtype!(MovementId, "MovementId");
impl_int_newtype!(LotId, "LotId");
impl_int_newtype!(SaleId, "SaleId");
impl_int_newtype!(SaleItemId, "SaleItemId");
impl_int_newtype!(PurchaseOrderId, "PurchaseOrderId");

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_non_positive_ids() {
        assert!(MedicineId::try_new(0).is_err());
        assert!(MedicineId::try_new(-4).is_err());
        assert_eq!(MedicineId::try_new(12).unwrap().get(), 12);
    }

    #[test]
    fn parses_trimmed_input() {
        let id: SaleId = " 42 ".parse().unwrap();
        assert_eq!(id, SaleId::from_raw(42));

        let err = "abc".parse::<SaleId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&LotId::from_raw(7)).unwrap();
        assert_eq!(json, "7");
    }

    proptest! {
        #[test]
        fn positive_ids_round_trip_through_display(raw in 1i64..i64::MAX) {
            let id = MedicineId::try_new(raw).unwrap();
            let parsed: MedicineId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}
