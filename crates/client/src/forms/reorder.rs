use rxstock_inventory::ReorderLevel;

use crate::api::StockApi;
use crate::error::ClientError;

pub async fn save_reorder_level<A>(api: &A, level: &ReorderLevel) -> Result<(), ClientError>
where
    A: StockApi + ?Sized,
{
    level.validate()?;
    api.save_reorder_level(level).await?;
    tracing::info!(medicine_id = %level.medicine.id, min = level.min_stock, "reorder level saved");
    Ok(())
}
