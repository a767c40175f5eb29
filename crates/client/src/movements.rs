//! Stock movement audit view.

use std::fmt::Display;
use std::sync::Arc;

use chrono::TimeZone;
use tracing::Instrument;

use rxstock_inventory::{
    ExportError, MovementCriteria, StockMovement, StockMovementSummary, filter_movements,
    filter_movements_in, summarize, to_delimited_text, to_delimited_text_in,
};

use crate::api::{MovementQuery, StockApi};
use crate::error::ClientError;
use crate::gate::{ApplyOutcome, GatedSnapshot, RequestTicket};

/// Holds the latest ledger snapshot and the user's filter criteria.
///
/// Medicine, type, and date criteria are sent to the backend on refresh;
/// the free-text query only narrows the local snapshot.
#[derive(Debug)]
pub struct MovementsView {
    snapshot: GatedSnapshot<[StockMovement]>,
    criteria: MovementCriteria,
    limit: u32,
}

impl MovementsView {
    pub fn new(limit: u32) -> Self {
        Self {
            snapshot: GatedSnapshot::new(Arc::from(Vec::new())),
            criteria: MovementCriteria::default(),
            limit,
        }
    }

    pub fn criteria(&self) -> &MovementCriteria {
        &self.criteria
    }

    /// Replace the criteria. Callers should `refresh` afterwards when
    /// server-side fields changed.
    pub fn set_criteria(&mut self, criteria: MovementCriteria) -> bool {
        let refetch = self.server_side_changed(&criteria);
        self.criteria = criteria;
        refetch
    }

    /// Update the free-text query (no refetch needed). Input from the search
    /// box is trimmed here; whitespace-only input clears the query.
    pub fn set_query(&mut self, query: &str) {
        let query = query.trim();
        self.criteria.query = (!query.is_empty()).then(|| query.to_string());
    }

    fn server_side_changed(&self, next: &MovementCriteria) -> bool {
        self.criteria.medicine_id != next.medicine_id
            || self.criteria.movement_type != next.movement_type
            || self.criteria.start_date != next.start_date
            || self.criteria.end_date != next.end_date
    }

    /// Start a fetch: take a ticket and the request parameters for it.
    pub fn begin_refresh(&self) -> (RequestTicket, MovementQuery) {
        let ticket = self.snapshot.begin();
        (ticket, MovementQuery::from_criteria(&self.criteria, self.limit))
    }

    /// Apply a fetch result; responses from superseded requests are dropped.
    pub fn apply(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<StockMovement>, ClientError>,
    ) -> ApplyOutcome {
        self.snapshot.apply(ticket, result.map(Arc::from))
    }

    pub async fn refresh<A>(&mut self, api: &A) -> ApplyOutcome
    where
        A: StockApi + ?Sized,
    {
        let (ticket, query) = self.begin_refresh();
        let result = api
            .fetch_movements(&query)
            .instrument(tracing::info_span!("movements.refresh", ticket = ticket.sequence()))
            .await;
        let outcome = self.apply(ticket, result);
        tracing::info!(?outcome, loaded = self.snapshot.get().len(), "movements refresh finished");
        outcome
    }

    /// Everything last fetched, before the free-text query.
    pub fn snapshot(&self) -> Arc<[StockMovement]> {
        self.snapshot.current()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.snapshot.last_error()
    }

    /// Snapshot narrowed by the criteria, date bounds read in the local zone.
    pub fn visible(&self) -> Vec<StockMovement> {
        filter_movements(self.snapshot.get(), &self.criteria)
    }

    pub fn visible_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<StockMovement> {
        filter_movements_in(self.snapshot.get(), &self.criteria, tz)
    }

    pub fn summaries(&self) -> Vec<StockMovementSummary> {
        summarize(&self.visible())
    }

    pub fn export_csv(&self) -> Result<String, ExportError> {
        to_delimited_text(&self.visible())
    }

    pub fn export_csv_in<Tz>(&self, tz: &Tz) -> Result<String, ExportError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        to_delimited_text_in(&self.visible_in(tz), tz)
    }
}
