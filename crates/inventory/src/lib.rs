//! Pharmacy stock domain (ledger, valuation, expiry, reorder, export).
//!
//! This crate contains deterministic domain logic only (no IO, no HTTP,
//! no storage). Every function takes a snapshot by reference and returns
//! derived values.

pub mod expiry;
pub mod export;
pub mod ledger;
pub mod lot;
pub mod movement;
pub mod reorder;
pub mod valuation;

pub use expiry::{
    ExpiryRisk, ExpiryThresholds, RiskBuckets, TierTotals, days_until_expiry,
    days_until_expiry_now, expiring_lots, risk_buckets,
};
pub use export::{
    ExportError, LOT_COLUMNS, MOVEMENT_COLUMNS, lots_to_delimited_text, to_delimited_text,
    to_delimited_text_in,
};
pub use ledger::{
    MovementCriteria, StockMovementSummary, filter_movements, filter_movements_in, net_change,
    summarize,
};
pub use lot::{ExpiringLot, LotStatus, StockLot};
pub use movement::{MedicineRef, MovementType, StockMovement};
pub use reorder::{ReorderLevel, ReorderStatus, ReorderSuggestion, reorder_report};
pub use valuation::{
    MedicineStockRow, PricingPolicy, StockValuation, UNKNOWN_MEDICINE, compute_valuation,
    group_by_medicine,
};
