//! Stock ledger query, filter, and per-type aggregation.

use std::collections::HashMap;

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use rxstock_core::MedicineId;

use crate::movement::{MovementType, StockMovement};

/// Filter criteria for the stock movement audit view.
///
/// Medicine, type, and date bounds are also sent to the backend as request
/// parameters; re-checking them here keeps filtering a pure narrowing of
/// whatever snapshot the caller holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementCriteria {
    pub medicine_id: Option<MedicineId>,
    pub movement_type: Option<MovementType>,
    /// Inclusive, compared against the calendar date of `created_at` in the
    /// display zone.
    pub start_date: Option<NaiveDate>,
    /// Inclusive.
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring over medicine name, type, reference type,
    /// and notes. Only the empty string means "no filter".
    pub query: Option<String>,
}

impl MovementCriteria {
    pub fn with_medicine(mut self, medicine_id: MedicineId) -> Self {
        self.medicine_id = Some(medicine_id);
        self
    }

    pub fn with_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// True when every present criterion holds for `movement`, with dates
    /// read in the local zone (the zone exports are rendered in).
    pub fn matches(&self, movement: &StockMovement) -> bool {
        self.matches_in(movement, &Local)
    }

    /// Like [`matches`](Self::matches), reading `created_at` in `tz`.
    pub fn matches_in<Tz: TimeZone>(&self, movement: &StockMovement, tz: &Tz) -> bool {
        if self.medicine_id.is_some_and(|id| movement.medicine.id != id) {
            return false;
        }
        if self.movement_type.is_some_and(|t| movement.movement_type != t) {
            return false;
        }

        let day = movement.created_at.with_timezone(tz).date_naive();
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }

        match self.query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => matches_text(movement, &query.to_lowercase()),
            None => true,
        }
    }
}

fn matches_text(movement: &StockMovement, needle: &str) -> bool {
    let fields = [
        movement.medicine.name.as_deref().unwrap_or(""),
        movement.movement_type.as_str(),
        movement.reference_type.as_deref().unwrap_or(""),
        movement.notes.as_deref().unwrap_or(""),
    ];

    fields
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Narrow `records` to those satisfying `criteria`, preserving input order.
/// Date bounds are read in the local zone.
pub fn filter_movements(records: &[StockMovement], criteria: &MovementCriteria) -> Vec<StockMovement> {
    filter_movements_in(records, criteria, &Local)
}

/// [`filter_movements`] with date bounds read in `tz`.
pub fn filter_movements_in<Tz: TimeZone>(
    records: &[StockMovement],
    criteria: &MovementCriteria,
    tz: &Tz,
) -> Vec<StockMovement> {
    records
        .iter()
        .filter(|m| criteria.matches_in(m, tz))
        .cloned()
        .collect()
}

/// Aggregate counters for one movement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovementSummary {
    pub movement_type: MovementType,
    pub count: u64,
    /// Sum of positive deltas.
    pub total_in: i64,
    /// Sum of absolute values of negative deltas.
    pub total_out: i64,
}

impl StockMovementSummary {
    fn empty(movement_type: MovementType) -> Self {
        Self {
            movement_type,
            count: 0,
            total_in: 0,
            total_out: 0,
        }
    }

    pub fn net(&self) -> i64 {
        self.total_in - self.total_out
    }
}

/// Group by movement type, in first-seen order.
///
/// Zero-quantity entries count toward `count` only. Totals saturate at
/// `i64::MAX` rather than overflow.
pub fn summarize(records: &[StockMovement]) -> Vec<StockMovementSummary> {
    let mut index: HashMap<MovementType, usize> = HashMap::new();
    let mut out: Vec<StockMovementSummary> = Vec::new();

    for m in records {
        let slot = *index.entry(m.movement_type).or_insert_with(|| {
            out.push(StockMovementSummary::empty(m.movement_type));
            out.len() - 1
        });

        let summary = &mut out[slot];
        summary.count = summary.count.saturating_add(1);
        if m.is_inbound() {
            summary.total_in = summary.total_in.saturating_add(m.quantity);
        } else if m.is_outbound() {
            let out = i64::try_from(m.quantity.unsigned_abs()).unwrap_or(i64::MAX);
            summary.total_out = summary.total_out.saturating_add(out);
        }
    }

    out
}

/// Signed sum of all deltas, saturating at the `i64` bounds.
pub fn net_change(records: &[StockMovement]) -> i64 {
    records
        .iter()
        .fold(0i64, |acc, m| acc.saturating_add(m.quantity))
}
