//! View-state layer for the pharmacy stock screens.
//!
//! Talks to the backend through [`StockApi`], keeps the latest fetched data
//! as immutable snapshots, and feeds them into the pure engines of
//! `rxstock-inventory`.

pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod gate;
pub mod http;
pub mod movements;
pub mod reports;

pub use api::{
    ImportFile, ImportReport, MovementQuery, ReceiptItem, ReceiptRequest, RefundItem,
    RefundRequest, SaleLine, SaleRecord, StockApi, SummaryQuery,
};
pub use config::ClientConfig;
pub use error::{ClientError, GENERIC_FAILURE_MESSAGE};
pub use forms::{ImportOutcome, ReceiptForm, ReceiptLine, RefundForm};
pub use gate::{ApplyOutcome, GatedSnapshot, RequestGate, RequestTicket};
pub use http::HttpStockApi;
pub use movements::MovementsView;
pub use reports::{ReportSnapshot, StockReportView};
