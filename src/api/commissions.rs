//! Consultant commission endpoints

use serde_json::Value;

use super::models::CommissionRecord;
use super::{ApiClient, ApiError};

/// Optional filters for the commission listing.
#[derive(Clone, Debug, Default)]
pub struct CommissionQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ApiClient {
    /// Commission records for the authenticated consultant, newest first.
    pub async fn my_commissions(&self, query: &CommissionQuery) -> Result<Vec<CommissionRecord>, ApiError> {
        let mut params: Vec<(&str, String)> = vec![];
        if let Some(status) = &query.status {
            params.push(("status", status.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset", offset.to_string()));
        }
        self.get_json_with_query("/commissions/me", &params).await
    }

    /// Aggregated commission totals. The shape varies across backend
    /// versions, so it is returned unparsed for display.
    pub async fn my_commission_summary(&self) -> Result<Value, ApiError> {
        self.get_json("/commissions/summary").await
    }
}
