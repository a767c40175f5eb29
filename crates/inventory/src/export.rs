//! Delimited-text (CSV) export of ledger and lot snapshots.
//!
//! Every field is quoted and embedded quotes are doubled. Rows end with
//! `\n`; an empty input produces the header line only.

use std::fmt::Display;

use chrono::{Local, TimeZone};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::lot::StockLot;
use crate::movement::StockMovement;

pub const MOVEMENT_COLUMNS: [&str; 9] = [
    "Date",
    "Medicine",
    "Type",
    "Quantity",
    "Stock Before",
    "Stock After",
    "Reference",
    "Notes",
    "Created By",
];

pub const LOT_COLUMNS: [&str; 9] = [
    "Medicine",
    "Batch",
    "Quantity",
    "Cost Price",
    "Selling Price",
    "Cost Value",
    "Selling Value",
    "Expiry Date",
    "Status",
];

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv record: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush csv buffer: {0}")]
    Flush(String),

    #[error("csv output is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Serialize movements with timestamps rendered in the local time zone.
pub fn to_delimited_text(records: &[StockMovement]) -> Result<String, ExportError> {
    to_delimited_text_in(records, &Local)
}

/// Serialize movements with timestamps rendered in `tz`.
pub fn to_delimited_text_in<Tz>(records: &[StockMovement], tz: &Tz) -> Result<String, ExportError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    write_rows(MOVEMENT_COLUMNS, records.iter().map(|m| movement_row(m, tz)))
}

pub fn lots_to_delimited_text(lots: &[StockLot]) -> Result<String, ExportError> {
    write_rows(LOT_COLUMNS, lots.iter().map(lot_row))
}

fn movement_row<Tz>(m: &StockMovement, tz: &Tz) -> [String; 9]
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    [
        m.created_at.with_timezone(tz).format(DATE_TIME_FORMAT).to_string(),
        m.medicine.name.clone().unwrap_or_default(),
        m.movement_type.as_str().to_string(),
        m.signed_quantity(),
        optional(m.stock_before),
        optional(m.stock_after),
        m.reference_label().unwrap_or_default(),
        m.notes.clone().unwrap_or_default(),
        m.created_by.clone().unwrap_or_default(),
    ]
}

fn lot_row(lot: &StockLot) -> [String; 9] {
    [
        lot.medicine.name.clone().unwrap_or_default(),
        lot.batch_number.clone(),
        lot.quantity.to_string(),
        lot.cost_price.to_string(),
        lot.selling_price.to_string(),
        lot.cost_value().to_string(),
        lot.selling_value().to_string(),
        lot.expiry_date.format("%Y-%m-%d").to_string(),
        lot.status.as_str().to_string(),
    ]
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows<I>(header: [&str; 9], rows: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = [String; 9]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
