//! Bulk stock import.

use serde::{Deserialize, Serialize};

use rxstock_core::DomainError;

use crate::api::{ImportFile, ImportReport, StockApi};
use crate::error::ClientError;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// How a bulk import went, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Complete { imported: u64 },
    Partial { imported: u64, total: u64, errors: Vec<String> },
    Failed { total: u64, errors: Vec<String> },
}

impl ImportOutcome {
    pub fn from_report(report: ImportReport) -> Self {
        let ImportReport {
            imported,
            total,
            errors,
        } = report;

        if imported == 0 && (total > 0 || !errors.is_empty()) {
            ImportOutcome::Failed { total, errors }
        } else if imported < total || !errors.is_empty() {
            ImportOutcome::Partial {
                imported,
                total,
                errors,
            }
        } else {
            ImportOutcome::Complete { imported }
        }
    }

    pub fn message(&self) -> String {
        match self {
            ImportOutcome::Complete { imported } => format!("Imported {imported} items"),
            ImportOutcome::Partial {
                imported, total, errors,
            } => format!(
                "Imported {imported} of {total} items ({} errors)",
                errors.len()
            ),
            ImportOutcome::Failed { total, .. } => format!("Import failed: 0 of {total} items imported"),
        }
    }
}

fn validate(file: &ImportFile) -> Result<(), DomainError> {
    if file.bytes.is_empty() {
        return Err(DomainError::validation("Select a non-empty file to import"));
    }

    let extension = file
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DomainError::validation(format!(
            "Unsupported file type: {}",
            file.file_name
        )));
    }
    Ok(())
}

pub async fn import_stock<A>(api: &A, file: &ImportFile) -> Result<ImportOutcome, ClientError>
where
    A: StockApi + ?Sized,
{
    validate(file)?;

    let report = api.submit_stock_import(file).await?;
    let outcome = ImportOutcome::from_report(report);
    match &outcome {
        ImportOutcome::Complete { imported } => {
            tracing::info!(file = %file.file_name, imported, "stock import complete")
        }
        ImportOutcome::Partial {
            imported, total, errors,
        } => tracing::warn!(
            file = %file.file_name,
            imported,
            total,
            errors = errors.len(),
            "stock import partially succeeded"
        ),
        ImportOutcome::Failed { total, errors } => tracing::warn!(
            file = %file.file_name,
            total,
            errors = errors.len(),
            "stock import imported nothing"
        ),
    }
    Ok(outcome)
}
