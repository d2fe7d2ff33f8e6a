use std::collections::HashSet;
use std::path::Path;

use crate::errors::CoreError;
use crate::models::holding::Holding;

const DEFAULT_HOLDINGS_JSON: &str = include_str!("default_holdings.json");

/// The built-in holding set: 26 NSE-listed positions across six sectors.
pub fn default_holdings() -> Vec<Holding> {
    // Embedded list is validated in tests.
    parse_holdings_json(DEFAULT_HOLDINGS_JSON).unwrap_or_default()
}

/// Parse and validate a JSON array of holdings.
pub fn parse_holdings_json(json: &str) -> Result<Vec<Holding>, CoreError> {
    let holdings: Vec<Holding> = serde_json::from_str(json)?;
    validate_holdings(&holdings)?;
    Ok(holdings)
}

/// Load holdings from a JSON file on disk.
pub fn load_holdings_from_file(path: impl AsRef<Path>) -> Result<Vec<Holding>, CoreError> {
    let json = std::fs::read_to_string(path)?;
    parse_holdings_json(&json)
}

/// Check basic field presence and id uniqueness.
///
/// Rules:
/// - id, name and sector must be non-blank
/// - purchase price must be finite and non-negative
/// - ids must be unique across the set
pub fn validate_holdings(holdings: &[Holding]) -> Result<(), CoreError> {
    let mut seen_ids = HashSet::new();

    for holding in holdings {
        if holding.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Holding '{}' has an empty id",
                holding.name
            )));
        }
        if holding.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Holding {} has an empty name",
                holding.id
            )));
        }
        if holding.sector.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Holding '{}' has an empty sector",
                holding.name
            )));
        }
        if !holding.purchase_price.is_finite() || holding.purchase_price < 0.0 {
            return Err(CoreError::Validation(format!(
                "Holding '{}' has invalid purchase price {} (must be finite and non-negative)",
                holding.name, holding.purchase_price
            )));
        }
        if !seen_ids.insert(holding.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate holding id: {}",
                holding.id
            )));
        }
    }

    Ok(())
}
