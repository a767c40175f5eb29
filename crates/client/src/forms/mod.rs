//! Form-driven mutations. Local validation runs first; an invalid form
//! never reaches the [`StockApi`](crate::api::StockApi).

pub mod import;
pub mod receipt;
pub mod refund;
pub mod reorder;

pub use import::{ImportOutcome, import_stock};
pub use receipt::{ReceiptForm, ReceiptLine};
pub use refund::RefundForm;
pub use reorder::save_reorder_level;
