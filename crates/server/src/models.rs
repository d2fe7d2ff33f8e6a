use portfolio_tracker_core::models::holding::{HoldingSortField, SortDirection};
use portfolio_tracker_core::models::summary::PortfolioSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Response envelope shared by every portfolio route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: Some(message.into()),
        }
    }
}

/// `?sortBy=presentValue&order=desc`; both optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl SortQuery {
    /// `None` when no sort was asked for, so the configured order is kept.
    pub fn parse(&self) -> Result<Option<(HoldingSortField, SortDirection)>, ApiError> {
        if self.sort_by.is_none() && self.order.is_none() {
            return Ok(None);
        }
        let field = match self.sort_by.as_deref() {
            Some(raw) => raw
                .parse::<HoldingSortField>()
                .map_err(|e| ApiError::bad_request("Invalid sortBy parameter", e))?,
            None => HoldingSortField::default(),
        };
        let direction = match self.order.as_deref() {
            Some(raw) => raw
                .parse::<SortDirection>()
                .map_err(|e| ApiError::bad_request("Invalid order parameter", e))?,
            None => SortDirection::default(),
        };
        Ok(Some((field, direction)))
    }
}

/// `?stocks=a,b,c` plus optional sort.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicQuery {
    pub stocks: Option<String>,
    #[serde(flatten)]
    pub sort: SortQuery,
}

impl DynamicQuery {
    /// Requested names, trimmed, blanks dropped.
    pub fn stock_names(&self) -> Result<Vec<String>, ApiError> {
        // An empty `?stocks=` counts as missing.
        let raw = self
            .stocks
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::bad_request(
                    "Missing stocks parameter",
                    "Please provide stocks parameter as comma-separated list",
                )
            })?;
        let names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() {
            return Err(ApiError::bad_request(
                "No valid stock names provided",
                "Please provide at least one valid stock name",
            ));
        }
        Ok(names)
    }
}

pub type SnapshotResponse = ApiResponse<PortfolioSnapshot>;
