use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use rxstock_client::forms::{ImportOutcome, ReceiptForm, ReceiptLine, RefundForm, import_stock, save_reorder_level};
use rxstock_client::{
    ApplyOutcome, ClientConfig, ClientError, GENERIC_FAILURE_MESSAGE, ImportFile, ImportReport,
    MovementQuery, MovementsView, ReceiptRequest, RefundRequest, SaleLine, SaleRecord, StockApi,
    StockReportView, SummaryQuery,
};
use rxstock_core::{LotId, MedicineId, MovementId, PurchaseOrderId, SaleId, SaleItemId};
use rxstock_inventory::{
    ExpiringLot, ExpiryThresholds, LotStatus, MedicineRef, MovementCriteria, MovementType,
    PricingPolicy, ReorderLevel, StockLot, StockMovement, StockMovementSummary, TierTotals,
};

/// In-memory backend double. Records every call so tests can assert that
/// invalid forms never reach it.
#[derive(Default)]
struct FakeStockApi {
    movements: Vec<StockMovement>,
    lots: Vec<StockLot>,
    expiring: Vec<ExpiringLot>,
    summary: Vec<StockMovementSummary>,
    sales: HashMap<String, SaleRecord>,
    import_report: ImportReport,
    /// When set, every call fails with this (status, message).
    failure: Mutex<Option<(u16, Option<String>)>>,
    calls: Mutex<Vec<String>>,
    refunds: Mutex<Vec<RefundRequest>>,
    receipts: Mutex<Vec<ReceiptRequest>>,
    summary_queries: Mutex<Vec<SummaryQuery>>,
}

impl FakeStockApi {
    fn record(&self, call: impl Into<String>) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call.into());
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(ClientError::remote(status, message)),
            None => Ok(()),
        }
    }

    fn fail_with(&self, status: u16, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(str::to_string)));
    }

    fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StockApi for FakeStockApi {
    async fn fetch_movements(&self, query: &MovementQuery) -> Result<Vec<StockMovement>, ClientError> {
        self.record("fetch_movements")?;
        let criteria = MovementCriteria {
            medicine_id: query.medicine_id,
            movement_type: query.movement_type,
            start_date: query.start_date,
            end_date: query.end_date,
            query: None,
        };
        Ok(self
            .movements
            .iter()
            .filter(|m| criteria.matches_in(m, &Utc))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_movement_summary(&self, query: &SummaryQuery) -> Result<Vec<StockMovementSummary>, ClientError> {
        self.record("fetch_movement_summary")?;
        self.summary_queries.lock().unwrap().push(query.clone());
        Ok(self.summary.clone())
    }

    async fn fetch_stock_lots(&self, status: LotStatus) -> Result<Vec<StockLot>, ClientError> {
        self.record("fetch_stock_lots")?;
        Ok(self.lots.iter().filter(|l| l.status == status).cloned().collect())
    }

    async fn fetch_expiring_lots(&self, _window_days: i64) -> Result<Vec<ExpiringLot>, ClientError> {
        self.record("fetch_expiring_lots")?;
        Ok(self.expiring.clone())
    }

    async fn submit_receipt(&self, request: &ReceiptRequest) -> Result<(), ClientError> {
        self.record("submit_receipt")?;
        self.receipts.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn submit_refund(&self, request: &RefundRequest) -> Result<(), ClientError> {
        self.record("submit_refund")?;
        self.refunds.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn submit_stock_import(&self, _file: &ImportFile) -> Result<ImportReport, ClientError> {
        self.record("submit_stock_import")?;
        Ok(self.import_report.clone())
    }

    async fn find_sale_by_invoice(&self, invoice_number: &str) -> Result<Option<SaleRecord>, ClientError> {
        self.record("find_sale_by_invoice")?;
        Ok(self.sales.get(invoice_number).cloned())
    }

    async fn fetch_reorder_levels(&self) -> Result<Vec<ReorderLevel>, ClientError> {
        self.record("fetch_reorder_levels")?;
        Ok(Vec::new())
    }

    async fn save_reorder_level(&self, _level: &ReorderLevel) -> Result<(), ClientError> {
        self.record("save_reorder_level")
    }
}

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
}

fn medicine(id: i64, name: &str) -> MedicineRef {
    MedicineRef::new(MedicineId::from_raw(id), name)
}

fn movement(id: i64, med: MedicineRef, movement_type: MovementType, quantity: i64, notes: Option<&str>) -> StockMovement {
    StockMovement {
        id: MovementId::from_raw(id),
        medicine: med,
        movement_type,
        quantity,
        stock_before: None,
        stock_after: None,
        reference_type: None,
        reference_id: None,
        notes: notes.map(str::to_string),
        created_by: Some("pharmacist".to_string()),
        created_at: as_of() - Duration::hours(id),
    }
}

fn lot(id: i64, med: MedicineRef, quantity: i64, cost: i64, selling: i64, expires_in: i64) -> StockLot {
    StockLot {
        id: LotId::from_raw(id),
        medicine: med,
        batch_number: format!("B{id}"),
        quantity,
        cost_price: Decimal::from(cost),
        selling_price: Decimal::from(selling),
        expiry_date: (as_of() + Duration::days(expires_in)).date_naive(),
        status: LotStatus::Active,
    }
}

fn ledger_api() -> FakeStockApi {
    FakeStockApi {
        movements: vec![
            movement(1, medicine(1, "Amoxicillin"), MovementType::Sale, -2, None),
            movement(2, medicine(2, "Lisinopril"), MovementType::Purchase, 50, Some("PO delivery")),
            movement(3, medicine(1, "Amoxicillin"), MovementType::Refund, 1, Some("customer return")),
            movement(4, medicine(2, "Lisinopril"), MovementType::Sale, -5, None),
        ],
        ..FakeStockApi::default()
    }
}

#[tokio::test]
async fn movements_view_filters_and_summarizes_snapshot() {
    rxstock_observability::init();
    let api = ledger_api();
    let mut view = MovementsView::new(100);

    assert_eq!(view.refresh(&api).await, ApplyOutcome::Applied);
    assert_eq!(view.snapshot().len(), 4);

    view.set_query("SALE");
    let visible: Vec<i64> = view.visible().iter().map(|m| m.id.get()).collect();
    assert_eq!(visible, vec![1, 4]);

    let summaries = view.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_out, 7);

    let csv = view.export_csv().unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("\"Date\",\"Medicine\""));
}

#[tokio::test]
async fn search_box_input_is_trimmed_before_filtering() {
    let api = ledger_api();
    let mut view = MovementsView::new(100);
    view.refresh(&api).await;

    view.set_query("  delivery ");
    assert_eq!(view.criteria().query.as_deref(), Some("delivery"));
    assert_eq!(view.visible().len(), 1);

    view.set_query("   ");
    assert_eq!(view.criteria().query, None);
    assert_eq!(view.visible().len(), 4);
}

#[tokio::test]
async fn date_range_matches_the_export_zone() {
    let mut late = movement(1, medicine(1, "Amoxicillin"), MovementType::Sale, -2, None);
    late.created_at = Utc.with_ymd_and_hms(2026, 5, 4, 22, 30, 0).unwrap();
    let api = FakeStockApi {
        movements: vec![late],
        ..FakeStockApi::default()
    };
    let mut view = MovementsView::new(100);
    view.refresh(&api).await;

    let day = NaiveDate::from_ymd_opt(2026, 5, 5);
    view.set_criteria(MovementCriteria::default().with_range(day, day));
    let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();

    assert_eq!(view.visible_in(&plus_three).len(), 1);
    let csv = view.export_csv_in(&plus_three).unwrap();
    assert!(csv.lines().nth(1).unwrap().starts_with("\"2026-05-05 01:30:00\""));
    assert!(view.visible_in(&Utc).is_empty());
}

#[tokio::test]
async fn server_side_criteria_trigger_refetch() {
    let api = ledger_api();
    let mut view = MovementsView::new(100);

    let refetch = view.set_criteria(MovementCriteria::default().with_medicine(MedicineId::from_raw(2)));
    assert!(refetch);
    view.refresh(&api).await;
    assert!(view.snapshot().iter().all(|m| m.medicine.id == MedicineId::from_raw(2)));

    let next = view.criteria().clone().with_query("delivery");
    assert!(!view.set_criteria(next));
    assert_eq!(view.visible().len(), 1);
}

#[tokio::test]
async fn stale_movement_response_is_discarded() {
    let api = ledger_api();
    let mut view = MovementsView::new(100);

    let (slow, slow_query) = view.begin_refresh();
    let (fast, fast_query) = view.begin_refresh();

    let fast_result = api.fetch_movements(&fast_query).await;
    assert_eq!(view.apply(fast, fast_result), ApplyOutcome::Applied);

    let slow_result = Ok(api.fetch_movements(&slow_query).await.unwrap()[..1].to_vec());
    assert_eq!(view.apply(slow, slow_result), ApplyOutcome::Stale);
    assert_eq!(view.snapshot().len(), 4);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_data() {
    let api = ledger_api();
    let mut view = MovementsView::new(100);
    view.refresh(&api).await;

    api.fail_with(504, None);
    assert_eq!(view.refresh(&api).await, ApplyOutcome::Failed);
    assert_eq!(view.snapshot().len(), 4);
    assert_eq!(view.last_error(), Some(GENERIC_FAILURE_MESSAGE));

    api.fail_with(400, Some("Invalid date range"));
    view.refresh(&api).await;
    assert_eq!(view.last_error(), Some("Invalid date range"));

    api.recover();
    view.refresh(&api).await;
    assert_eq!(view.last_error(), None);
}

#[tokio::test]
async fn report_view_derives_valuation_rows_and_risk() {
    let lots = vec![
        lot(1, medicine(7, "Metformin"), 10, 2, 3, 5),
        lot(2, medicine(7, "Metformin"), 20, 3, 4, 20),
        lot(3, medicine(8, "Atenolol"), 4, 5, 8, 200),
    ];
    let api = FakeStockApi {
        expiring: lots[..2]
            .iter()
            .cloned()
            .map(|l| ExpiringLot { lot: l, days_remaining: 0 })
            .collect(),
        lots,
        ..FakeStockApi::default()
    };

    let mut view = StockReportView::new(90, ExpiryThresholds::default());
    assert_eq!(view.refresh(&api, as_of()).await, ApplyOutcome::Applied);

    let valuation = view.valuation();
    assert_eq!(valuation.cost_value, Decimal::from(100));
    assert_eq!(valuation.selling_value, Decimal::from(142));
    assert_eq!(valuation.potential_profit, Decimal::from(42));

    let rows = view.medicine_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].total_quantity, 30);
    assert_eq!(rows[0].batch_count, 2);
    assert_eq!(rows[0].total_cost_value, Decimal::from(80));

    let buckets = view.risk_buckets();
    assert_eq!(buckets.critical, TierTotals { lots: 1, quantity: 10 });
    assert_eq!(buckets.warning, TierTotals { lots: 1, quantity: 20 });

    let levels = vec![ReorderLevel {
        medicine: medicine(8, "Atenolol"),
        min_stock: 10,
        max_stock: None,
        reorder_quantity: 30,
        auto_reorder: true,
    }];
    let report = view.reorder_report(&levels);
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].suggested_quantity, 30);

    assert_eq!(view.export_lots_csv().unwrap().lines().count(), 4);
}

#[tokio::test]
async fn report_view_sends_summary_window() {
    let api = FakeStockApi::default();
    let mut view = StockReportView::new(90, ExpiryThresholds::default());
    let window = SummaryQuery {
        medicine_id: Some(MedicineId::from_raw(3)),
        start_date: NaiveDate::from_ymd_opt(2026, 9, 1),
        end_date: NaiveDate::from_ymd_opt(2026, 9, 30),
    };
    view.set_window(window.clone());
    assert_eq!(view.window(), &window);

    view.refresh(&api, as_of()).await;
    assert_eq!(*api.summary_queries.lock().unwrap(), vec![window]);
}

fn refund_api() -> FakeStockApi {
    let sale = SaleRecord {
        id: SaleId::from_raw(55),
        invoice_number: "INV-0042".to_string(),
        lines: vec![
            SaleLine {
                id: SaleItemId::from_raw(1),
                medicine: medicine(1, "Amoxicillin"),
                quantity: 3,
                refunded_quantity: 1,
                unit_price: Decimal::new(450, 2),
            },
            SaleLine {
                id: SaleItemId::from_raw(2),
                medicine: medicine(3, "Cetirizine"),
                quantity: 1,
                refunded_quantity: 0,
                unit_price: Decimal::new(299, 2),
            },
        ],
    };
    FakeStockApi {
        sales: HashMap::from([(sale.invoice_number.clone(), sale)]),
        ..FakeStockApi::default()
    }
}

#[tokio::test]
async fn refund_lookup_miss_is_not_found() {
    let api = refund_api();
    let mut form = RefundForm::new();

    let err = form.lookup(&api, "INV-9999").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(err.user_message(), "No sale found for invoice INV-9999");
    assert!(form.sale().is_none());
}

#[tokio::test]
async fn refund_remote_failure_keeps_loaded_sale() {
    let api = refund_api();
    let mut form = RefundForm::new();
    form.lookup(&api, "INV-0042").await.unwrap();
    form.select_line(SaleItemId::from_raw(1), 2).unwrap();

    api.fail_with(503, Some("Service unavailable"));
    let err = form.lookup(&api, "INV-0042").await.unwrap_err();
    assert_eq!(err.user_message(), "Service unavailable");
    assert_eq!(form.sale().map(|s| s.id), Some(SaleId::from_raw(55)));
    assert_eq!(form.refund_total(), Decimal::new(900, 2));

    api.recover();
    assert!(form.lookup(&api, "INV-9999").await.is_err());
    assert!(form.sale().is_none());
    assert_eq!(form.refund_total(), Decimal::ZERO);
}

#[tokio::test]
async fn refund_validation_never_reaches_backend() {
    let api = refund_api();
    let mut form = RefundForm::new();
    form.lookup(&api, " INV-0042 ").await.unwrap();

    let err = form.submit(&api).await.unwrap_err();
    assert!(err.is_validation());

    assert!(form.select_line(SaleItemId::from_raw(1), 3).is_err());
    form.select_line(SaleItemId::from_raw(1), 2).unwrap();
    let err = form.submit(&api).await.unwrap_err();
    assert_eq!(err.user_message(), "Enter a reason for the refund");

    assert_eq!(api.calls(), vec!["find_sale_by_invoice".to_string()]);
}

#[tokio::test]
async fn refund_submits_selected_lines() {
    let api = refund_api();
    let mut form = RefundForm::new();
    form.lookup(&api, "INV-0042").await.unwrap();
    form.select_line(SaleItemId::from_raw(1), 2).unwrap();
    form.select_line(SaleItemId::from_raw(2), 1).unwrap();
    form.set_reason("Wrong strength dispensed");
    form.set_return_to_stock(false);

    assert_eq!(form.refund_total(), Decimal::new(1199, 2));

    let request = form.submit(&api).await.unwrap();
    assert_eq!(request.sale_id, SaleId::from_raw(55));
    assert_eq!(request.items.len(), 2);
    assert!(!request.return_to_stock);
    assert!(form.sale().is_none());
    assert_eq!(api.refunds.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn receipt_failure_keeps_lines_for_retry() {
    let api = FakeStockApi::default();
    let mut form = ReceiptForm::new(as_of().date_naive(), PricingPolicy::default());
    form.set_purchase_order(PurchaseOrderId::from_raw(9));
    form.add_line(ReceiptLine {
        medicine_id: MedicineId::from_raw(4),
        quantity: 10,
        batch_number: "RX-1".to_string(),
        expiry_date: NaiveDate::from_ymd_opt(2027, 12, 31),
        cost_price: Decimal::from(2),
        selling_price: None,
    });

    api.fail_with(422, Some("Purchase order already received"));
    let err = form.submit(&api).await.unwrap_err();
    assert_eq!(err.user_message(), "Purchase order already received");
    assert_eq!(form.lines().len(), 1);

    api.recover();
    let request = form.submit(&api).await.unwrap();
    assert_eq!(request.items[0].selling_price, Decimal::from(3));
    assert!(form.lines().is_empty());
}

#[tokio::test]
async fn partial_import_is_reported_distinctly() {
    let api = FakeStockApi {
        import_report: ImportReport {
            imported: 18,
            total: 20,
            errors: vec!["row 4: unknown medicine code".into(), "row 9: missing expiry".into()],
        },
        ..FakeStockApi::default()
    };
    let file = ImportFile {
        file_name: "opening-stock.csv".to_string(),
        bytes: b"code,batch,qty\n".to_vec(),
    };

    let outcome = import_stock(&api, &file).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::Partial { imported: 18, total: 20, .. }));

    let empty = ImportFile {
        file_name: "opening-stock.csv".to_string(),
        bytes: Vec::new(),
    };
    assert!(import_stock(&api, &empty).await.unwrap_err().is_validation());
    assert_eq!(api.calls(), vec!["submit_stock_import".to_string()]);
}

#[tokio::test]
async fn invalid_reorder_level_is_rejected_locally() {
    let api = FakeStockApi::default();
    let level = ReorderLevel {
        medicine: medicine(2, "Lisinopril"),
        min_stock: 20,
        max_stock: Some(10),
        reorder_quantity: 5,
        auto_reorder: false,
    };

    assert!(save_reorder_level(&api, &level).await.unwrap_err().is_validation());
    assert!(api.calls().is_empty());
}

#[test]
fn config_defaults_feed_views() {
    let config = ClientConfig::default();
    let view = MovementsView::new(config.movement_limit);
    let (_, query) = view.begin_refresh();
    assert_eq!(query.limit, 500);
}
