//! CSV deal ingestion. Parsing is strict about the header contract but
//! tolerant of blank optional cells; row-level validation happens during
//! mapping so one malformed listing never aborts an import batch.

mod parser;

pub use parser::{parse_deals, DealRow};

use chrono::{DateTime, Utc};

use crate::workflows::matching::domain::{Deal, DealId, DealStatus, TenantId};

/// Error raised while reading an import payload.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    InvalidRow(String),
}

/// Map one parsed row to a deal owned by `tenant_id`. New deals always start
/// in the `new` status.
pub fn into_deal(row: DealRow, tenant_id: TenantId, at: DateTime<Utc>) -> Result<Deal, ImportError> {
    if row.address.trim().is_empty() {
        return Err(ImportError::InvalidRow("missing address".to_string()));
    }
    let Some(list_price) = row.list_price.filter(|price| *price > 0.0) else {
        return Err(ImportError::InvalidRow(format!(
            "'{}' has no positive list price",
            row.address.trim()
        )));
    };

    Ok(Deal {
        id: DealId::generate(),
        tenant_id,
        address_line1: row.address.trim().to_string(),
        city: row.city.trim().to_string(),
        state: row.state.trim().to_string(),
        zip: row.zip.trim().to_string(),
        property_type: row.property_type.map(|value| value.trim().to_string()),
        beds: row.beds,
        baths: row.baths,
        sqft: row.sqft,
        year_built: row.year_built,
        list_price,
        hoa_monthly: row.hoa_monthly,
        tax_annual: row.tax_annual,
        insurance_annual: row.insurance_annual,
        estimated_rent: row.estimated_rent,
        status: DealStatus::New,
        created_at: at,
        updated_at: at,
    })
}
