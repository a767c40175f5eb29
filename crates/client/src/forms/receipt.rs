//! Receiving stock against a purchase order.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use rxstock_core::{DomainError, DomainResult, MedicineId, PurchaseOrderId};
use rxstock_inventory::PricingPolicy;

use crate::api::{ReceiptItem, ReceiptRequest, StockApi};
use crate::error::ClientError;

/// One line as typed into the receiving form. Batch and expiry may still
/// be missing; `build_request` rejects that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub medicine_id: MedicineId,
    pub quantity: i64,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub cost_price: Decimal,
    /// Defaults to `cost × markup` when absent.
    pub selling_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ReceiptForm {
    purchase_order_id: Option<PurchaseOrderId>,
    received_on: NaiveDate,
    lines: Vec<ReceiptLine>,
    pricing: PricingPolicy,
}

impl ReceiptForm {
    pub fn new(received_on: NaiveDate, pricing: PricingPolicy) -> Self {
        Self {
            purchase_order_id: None,
            received_on,
            lines: Vec::new(),
            pricing,
        }
    }

    pub fn set_purchase_order(&mut self, id: PurchaseOrderId) {
        self.purchase_order_id = Some(id);
    }

    pub fn add_line(&mut self, line: ReceiptLine) {
        self.lines.push(line);
    }

    pub fn remove_line(&mut self, index: usize) -> Option<ReceiptLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Total cost of the lines as entered.
    pub fn total_cost(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.cost_price * Decimal::from(l.quantity))
            .sum()
    }

    pub fn build_request(&self) -> DomainResult<ReceiptRequest> {
        let purchase_order_id = self
            .purchase_order_id
            .ok_or_else(|| DomainError::validation("Select a purchase order"))?;

        if self.lines.is_empty() {
            return Err(DomainError::validation("Add at least one item to receive"));
        }

        let items = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| self.build_item(i + 1, line))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(ReceiptRequest {
            purchase_order_id,
            received_on: self.received_on,
            items,
        })
    }

    fn build_item(&self, row: usize, line: &ReceiptLine) -> DomainResult<ReceiptItem> {
        if line.quantity <= 0 {
            return Err(DomainError::validation(format!("Item {row}: quantity must be positive")));
        }

        let batch_number = line.batch_number.trim();
        if batch_number.is_empty() {
            return Err(DomainError::validation(format!("Item {row}: batch number is required")));
        }

        let expiry_date = line
            .expiry_date
            .ok_or_else(|| DomainError::validation(format!("Item {row}: expiry date is required")))?;
        if expiry_date <= self.received_on {
            return Err(DomainError::validation(format!(
                "Item {row}: expiry date must be after {}",
                self.received_on
            )));
        }

        if line.cost_price < Decimal::ZERO {
            return Err(DomainError::validation(format!("Item {row}: cost price cannot be negative")));
        }

        let selling_price = line
            .selling_price
            .unwrap_or_else(|| self.pricing.default_selling_price(line.cost_price));
        if selling_price < Decimal::ZERO {
            return Err(DomainError::validation(format!("Item {row}: selling price cannot be negative")));
        }

        Ok(ReceiptItem {
            medicine_id: line.medicine_id,
            quantity: line.quantity,
            batch_number: batch_number.to_string(),
            expiry_date,
            cost_price: line.cost_price,
            selling_price,
        })
    }

    /// Validate and submit; lines are cleared on success and kept on failure.
    pub async fn submit<A>(&mut self, api: &A) -> Result<ReceiptRequest, ClientError>
    where
        A: StockApi + ?Sized,
    {
        let request = self.build_request()?;
        api.submit_receipt(&request).await?;

        tracing::info!(
            purchase_order_id = %request.purchase_order_id,
            items = request.items.len(),
            "stock received"
        );
        self.lines.clear();
        self.purchase_order_id = None;
        Ok(request)
    }
}
