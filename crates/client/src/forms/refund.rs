//! Refund against a past sale, looked up by invoice number.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use rxstock_core::{DomainError, DomainResult, SaleItemId};

use crate::api::{RefundItem, RefundRequest, SaleRecord, StockApi};
use crate::error::ClientError;

#[derive(Debug, Clone, Default)]
pub struct RefundForm {
    sale: Option<SaleRecord>,
    selected: BTreeMap<SaleItemId, i64>,
    reason: String,
    return_to_stock: bool,
}

impl RefundForm {
    pub fn new() -> Self {
        Self {
            return_to_stock: true,
            ..Self::default()
        }
    }

    pub fn sale(&self) -> Option<&SaleRecord> {
        self.sale.as_ref()
    }

    /// Look up the sale to refund. On a miss the sale section is cleared and
    /// `NotFound` is returned; reason and stock flag are kept. A remote
    /// failure leaves the previously loaded sale and selection untouched.
    pub async fn lookup<A>(&mut self, api: &A, invoice_number: &str) -> Result<&SaleRecord, ClientError>
    where
        A: StockApi + ?Sized,
    {
        let invoice_number = invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(DomainError::validation("Enter an invoice number").into());
        }

        match api.find_sale_by_invoice(invoice_number).await? {
            Some(sale) => {
                self.selected.clear();
                Ok(&*self.sale.insert(sale))
            }
            None => {
                self.sale = None;
                self.selected.clear();
                tracing::info!(invoice_number, "no sale found for invoice");
                Err(ClientError::NotFound(format!(
                    "No sale found for invoice {invoice_number}"
                )))
            }
        }
    }

    /// Set the quantity to refund for one line; zero deselects it.
    pub fn select_line(&mut self, line_id: SaleItemId, quantity: i64) -> DomainResult<()> {
        let sale = self
            .sale
            .as_ref()
            .ok_or_else(|| DomainError::validation("Look up a sale first"))?;
        let line = sale
            .line(line_id)
            .ok_or_else(|| DomainError::not_found(format!("sale line {line_id}")))?;

        if quantity < 0 {
            return Err(DomainError::validation("Refund quantity cannot be negative"));
        }
        if quantity > line.refundable() {
            return Err(DomainError::validation(format!(
                "Only {} units of this line can be refunded",
                line.refundable()
            )));
        }

        if quantity == 0 {
            self.selected.remove(&line_id);
        } else {
            self.selected.insert(line_id, quantity);
        }
        Ok(())
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
    }

    pub fn set_return_to_stock(&mut self, return_to_stock: bool) {
        self.return_to_stock = return_to_stock;
    }

    /// Sum of `quantity × unit_price` over selected lines.
    pub fn refund_total(&self) -> Decimal {
        let Some(sale) = &self.sale else {
            return Decimal::ZERO;
        };
        self.selected
            .iter()
            .filter_map(|(id, qty)| sale.line(*id).map(|l| l.unit_price * Decimal::from(*qty)))
            .sum()
    }

    pub fn build_request(&self) -> DomainResult<RefundRequest> {
        let sale = self
            .sale
            .as_ref()
            .ok_or_else(|| DomainError::validation("Look up a sale first"))?;

        if self.selected.is_empty() {
            return Err(DomainError::validation("Select at least one item to refund"));
        }

        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("Enter a reason for the refund"));
        }

        Ok(RefundRequest {
            sale_id: sale.id,
            items: self
                .selected
                .iter()
                .map(|(id, qty)| RefundItem {
                    sale_item_id: *id,
                    quantity: *qty,
                })
                .collect(),
            reason: reason.to_string(),
            return_to_stock: self.return_to_stock,
        })
    }

    /// Validate and submit; the form resets on success and is kept on failure.
    pub async fn submit<A>(&mut self, api: &A) -> Result<RefundRequest, ClientError>
    where
        A: StockApi + ?Sized,
    {
        let request = self.build_request()?;
        api.submit_refund(&request).await?;

        tracing::info!(
            sale_id = %request.sale_id,
            items = request.items.len(),
            return_to_stock = request.return_to_stock,
            "refund submitted"
        );
        *self = Self::new();
        Ok(request)
    }
}
