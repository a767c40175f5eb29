//! Data-access collaborator: the backend operations the stock screens consume.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::{MedicineId, PurchaseOrderId, SaleId, SaleItemId};
use rxstock_inventory::{
    ExpiringLot, LotStatus, MedicineRef, MovementCriteria, MovementType, ReorderLevel,
    StockLot, StockMovement, StockMovementSummary,
};

use crate::error::ClientError;

/// Server-side filters for the movement ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementQuery {
    pub medicine_id: Option<MedicineId>,
    pub movement_type: Option<MovementType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: u32,
}

impl MovementQuery {
    /// Request parameters for `criteria`; the free-text query stays client-side.
    pub fn from_criteria(criteria: &MovementCriteria, limit: u32) -> Self {
        Self {
            medicine_id: criteria.medicine_id,
            movement_type: criteria.movement_type,
            start_date: criteria.start_date,
            end_date: criteria.end_date,
            limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryQuery {
    pub medicine_id: Option<MedicineId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One received line of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub medicine_id: MedicineId,
    pub quantity: i64,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRequest {
    pub purchase_order_id: PurchaseOrderId,
    pub received_on: NaiveDate,
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundItem {
    pub sale_item_id: SaleItemId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub sale_id: SaleId,
    pub items: Vec<RefundItem>,
    pub reason: String,
    pub return_to_stock: bool,
}

/// File handed to the bulk import endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Backend verdict on a bulk import. Partial success is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: u64,
    pub total: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A sale looked up by invoice number for refunding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub invoice_number: String,
    pub lines: Vec<SaleLine>,
}

impl SaleRecord {
    pub fn line(&self, id: SaleItemId) -> Option<&SaleLine> {
        self.lines.iter().find(|l| l.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: SaleItemId,
    pub medicine: MedicineRef,
    pub quantity: i64,
    #[serde(default)]
    pub refunded_quantity: i64,
    pub unit_price: Decimal,
}

impl SaleLine {
    pub fn refundable(&self) -> i64 {
        (self.quantity - self.refunded_quantity).max(0)
    }
}

/// Backend operations used by the stock screens.
///
/// Implementations report transport and server failures as [`ClientError`];
/// they never see locally invalid input.
#[async_trait]
pub trait StockApi: Send + Sync {
    async fn fetch_movements(&self, query: &MovementQuery) -> Result<Vec<StockMovement>, ClientError>;

    async fn fetch_movement_summary(
        &self,
        query: &SummaryQuery,
    ) -> Result<Vec<StockMovementSummary>, ClientError>;

    async fn fetch_stock_lots(&self, status: LotStatus) -> Result<Vec<StockLot>, ClientError>;

    async fn fetch_expiring_lots(&self, window_days: i64) -> Result<Vec<ExpiringLot>, ClientError>;

    async fn submit_receipt(&self, request: &ReceiptRequest) -> Result<(), ClientError>;

    async fn submit_refund(&self, request: &RefundRequest) -> Result<(), ClientError>;

    async fn submit_stock_import(&self, file: &ImportFile) -> Result<ImportReport, ClientError>;

    /// `Ok(None)` when no sale carries `invoice_number`.
    async fn find_sale_by_invoice(&self, invoice_number: &str) -> Result<Option<SaleRecord>, ClientError>;

    async fn fetch_reorder_levels(&self) -> Result<Vec<ReorderLevel>, ClientError>;

    async fn save_reorder_level(&self, level: &ReorderLevel) -> Result<(), ClientError>;
}
