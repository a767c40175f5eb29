//! Stock reports view: valuation, expiry risk, per-medicine rows, reorder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::Instrument;

use rxstock_inventory::{
    ExpiringLot, ExpiryThresholds, ExportError, LotStatus, MedicineStockRow, ReorderLevel,
    ReorderSuggestion, RiskBuckets, StockLot, StockMovementSummary, StockValuation,
    compute_valuation, group_by_medicine, lots_to_delimited_text, reorder_report, risk_buckets,
};

use crate::api::{StockApi, SummaryQuery};
use crate::error::ClientError;
use crate::gate::{ApplyOutcome, GatedSnapshot, RequestTicket};

/// Everything one report refresh loads, captured at `as_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSnapshot {
    pub as_of: DateTime<Utc>,
    pub lots: Vec<StockLot>,
    pub expiring: Vec<ExpiringLot>,
    pub movement_summary: Vec<StockMovementSummary>,
}

impl ReportSnapshot {
    pub fn empty(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            lots: Vec::new(),
            expiring: Vec::new(),
            movement_summary: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct StockReportView {
    snapshot: GatedSnapshot<ReportSnapshot>,
    window: SummaryQuery,
    expiry_window_days: i64,
    thresholds: ExpiryThresholds,
}

impl StockReportView {
    pub fn new(expiry_window_days: i64, thresholds: ExpiryThresholds) -> Self {
        Self {
            snapshot: GatedSnapshot::new(Arc::new(ReportSnapshot::empty(Utc::now()))),
            window: SummaryQuery::default(),
            expiry_window_days,
            thresholds,
        }
    }

    /// Reporting window for the movement summary panel.
    pub fn set_window(&mut self, window: SummaryQuery) {
        self.window = window;
    }

    pub fn window(&self) -> &SummaryQuery {
        &self.window
    }

    pub fn begin_refresh(&self) -> RequestTicket {
        self.snapshot.begin()
    }

    pub fn apply(&mut self, ticket: RequestTicket, result: Result<ReportSnapshot, ClientError>) -> ApplyOutcome {
        self.snapshot.apply(ticket, result.map(Arc::new))
    }

    /// Load active lots, expiring lots, and the movement summary as of `as_of`.
    pub async fn refresh<A>(&mut self, api: &A, as_of: DateTime<Utc>) -> ApplyOutcome
    where
        A: StockApi + ?Sized,
    {
        let ticket = self.begin_refresh();
        let span = tracing::info_span!("reports.refresh", ticket = ticket.sequence());
        let result = self.load(api, as_of).instrument(span).await;
        let outcome = self.apply(ticket, result);
        tracing::info!(?outcome, lots = self.snapshot.get().lots.len(), "report refresh finished");
        outcome
    }

    async fn load<A>(&self, api: &A, as_of: DateTime<Utc>) -> Result<ReportSnapshot, ClientError>
    where
        A: StockApi + ?Sized,
    {
        let lots = api.fetch_stock_lots(LotStatus::Active).await?;
        let expiring = api
            .fetch_expiring_lots(self.expiry_window_days)
            .await?
            .into_iter()
            .map(|e| e.refreshed(as_of))
            .collect();
        let movement_summary = api.fetch_movement_summary(&self.window).await?;

        Ok(ReportSnapshot {
            as_of,
            lots,
            expiring,
            movement_summary,
        })
    }

    pub fn snapshot(&self) -> Arc<ReportSnapshot> {
        self.snapshot.current()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.snapshot.last_error()
    }

    pub fn valuation(&self) -> StockValuation {
        compute_valuation(&self.snapshot.get().lots)
    }

    pub fn medicine_rows(&self) -> Vec<MedicineStockRow> {
        group_by_medicine(&self.snapshot.get().lots)
    }

    pub fn risk_buckets(&self) -> RiskBuckets {
        risk_buckets(&self.snapshot.get().expiring, self.thresholds)
    }

    pub fn reorder_report(&self, levels: &[ReorderLevel]) -> Vec<ReorderSuggestion> {
        reorder_report(&self.medicine_rows(), levels)
    }

    pub fn export_lots_csv(&self) -> Result<String, ExportError> {
        lots_to_delimited_text(&self.snapshot.get().lots)
    }
}
