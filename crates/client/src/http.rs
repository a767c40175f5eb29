//! REST implementation of [`StockApi`] over `reqwest`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use rxstock_inventory::{
    ExpiringLot, LotStatus, ReorderLevel, StockLot, StockMovement, StockMovementSummary,
};

use crate::api::{
    ImportFile, ImportReport, MovementQuery, ReceiptRequest, RefundRequest, SaleRecord, StockApi,
    SummaryQuery,
};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Error body shapes the backend is known to return.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

pub struct HttpStockApi {
    api_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpStockApi {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(api_url)
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.auth_token {
            Some(token) => Self::with_token(config.api_url.clone(), token.clone()),
            None => Self::new(config.api_url.clone()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let resp = self.authorized(req).send().await?;
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::remote(status.as_u16(), error_message(&body)))
    }

    async fn get_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.send(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Message from a JSON error body, or the raw body when it is short plain text.
fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message.or(parsed.error);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<'))
        .then(|| trimmed.to_string())
}

fn movement_params(query: &MovementQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("limit", query.limit.to_string())];
    if let Some(id) = query.medicine_id {
        params.push(("medicine_id", id.to_string()));
    }
    if let Some(t) = query.movement_type {
        params.push(("movement_type", t.as_str().to_string()));
    }
    if let Some(d) = query.start_date {
        params.push(("start_date", d.to_string()));
    }
    if let Some(d) = query.end_date {
        params.push(("end_date", d.to_string()));
    }
    params
}

fn summary_params(query: &SummaryQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(id) = query.medicine_id {
        params.push(("medicine_id", id.to_string()));
    }
    if let Some(d) = query.start_date {
        params.push(("start_date", d.to_string()));
    }
    if let Some(d) = query.end_date {
        params.push(("end_date", d.to_string()));
    }
    params
}

#[async_trait]
impl StockApi for HttpStockApi {
    async fn fetch_movements(&self, query: &MovementQuery) -> Result<Vec<StockMovement>, ClientError> {
        let req = self
            .client
            .get(self.url("/stock-movements"))
            .query(&movement_params(query));
        let movements: Vec<StockMovement> = self.get_json(req).await?;
        tracing::debug!(count = movements.len(), "fetched stock movements");
        Ok(movements)
    }

    async fn fetch_movement_summary(
        &self,
        query: &SummaryQuery,
    ) -> Result<Vec<StockMovementSummary>, ClientError> {
        let req = self
            .client
            .get(self.url("/stock-movements/summary"))
            .query(&summary_params(query));
        self.get_json(req).await
    }

    async fn fetch_stock_lots(&self, status: LotStatus) -> Result<Vec<StockLot>, ClientError> {
        let req = self
            .client
            .get(self.url("/stock-lots"))
            .query(&[("status", status.as_str())]);
        self.get_json(req).await
    }

    async fn fetch_expiring_lots(&self, window_days: i64) -> Result<Vec<ExpiringLot>, ClientError> {
        let req = self
            .client
            .get(self.url("/stock-lots/expiring"))
            .query(&[("days", window_days)]);
        self.get_json(req).await
    }

    async fn submit_receipt(&self, request: &ReceiptRequest) -> Result<(), ClientError> {
        let path = format!("/purchase-orders/{}/receive", request.purchase_order_id);
        self.send(self.client.post(self.url(&path)).json(request)).await?;
        Ok(())
    }

    async fn submit_refund(&self, request: &RefundRequest) -> Result<(), ClientError> {
        let path = format!("/sales/{}/refund", request.sale_id);
        self.send(self.client.post(self.url(&path)).json(request)).await?;
        Ok(())
    }

    async fn submit_stock_import(&self, file: &ImportFile) -> Result<ImportReport, ClientError> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let form = reqwest::multipart::Form::new().part("file", part);
        let req = self.client.post(self.url("/stock/import")).multipart(form);
        self.get_json(req).await
    }

    async fn find_sale_by_invoice(&self, invoice_number: &str) -> Result<Option<SaleRecord>, ClientError> {
        let req = self
            .client
            .get(self.url("/sales/by-invoice"))
            .query(&[("invoice_number", invoice_number)]);

        match self.get_json(req).await {
            Ok(sale) => Ok(Some(sale)),
            Err(ClientError::Remote {
                status: Some(code), ..
            }) if code == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_reorder_levels(&self) -> Result<Vec<ReorderLevel>, ClientError> {
        self.get_json(self.client.get(self.url("/reorder-levels"))).await
    }

    async fn save_reorder_level(&self, level: &ReorderLevel) -> Result<(), ClientError> {
        let path = format!("/reorder-levels/{}", level.medicine.id);
        self.send(self.client.put(self.url(&path)).json(level)).await?;
        Ok(())
    }
}
