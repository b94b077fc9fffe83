//! Search defaults persisted in the catalog `settings` table.

use crate::{
    catalog_db::CatalogDb,
    error::{Error, Result},
    ranking::DEFAULT_LIMIT,
    scorer::{FieldWeights, SearchField, parse_weight},
};

const MAX_RESULTS_KEY: &str = "search.max_results";

fn weight_key(field: SearchField) -> String {
    format!("weight.{field}")
}

/// Stored field weights, falling back to the defaults per field.
pub fn load_weights(catalog: &CatalogDb) -> Result<FieldWeights> {
    let mut weights = FieldWeights::default();
    for field in SearchField::ALL {
        if let Some(raw) = catalog.get_setting(&weight_key(field))? {
            weights.set(field, parse_weight(&raw)?);
        }
    }
    Ok(weights)
}

pub fn store_weight(
    catalog: &CatalogDb,
    field: SearchField,
    weight: f64,
) -> Result<()> {
    catalog.set_setting(&weight_key(field), &weight.to_string())
}

pub fn clear_weights(catalog: &CatalogDb) -> Result<()> {
    for field in SearchField::ALL {
        catalog.remove_setting(&weight_key(field))?;
    }
    Ok(())
}

pub fn max_results(catalog: &CatalogDb) -> Result<usize> {
    let raw =
        catalog.get_setting_or(MAX_RESULTS_KEY, &DEFAULT_LIMIT.to_string())?;
    raw.trim().parse().map_err(|_| {
        Error::Config(format!("invalid {MAX_RESULTS_KEY} setting: {raw}"))
    })
}

pub fn store_max_results(catalog: &CatalogDb, limit: usize) -> Result<()> {
    catalog.set_setting(MAX_RESULTS_KEY, &limit.to_string())
}
