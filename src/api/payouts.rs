//! Consultant and admin payout endpoints

use serde::{Deserialize, Serialize};

use super::models::{PaymentMethod, Payout};
use super::{ApiClient, ApiError};

#[derive(Clone, Debug, Serialize)]
struct GeneratePayoutsRequest {
    days: u32,
}

/// Result of an admin payout-generation run.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneratePayoutsResult {
    pub created: u32,
    pub period_start: String,
    pub period_end: String,
}

#[derive(Clone, Debug, Serialize)]
struct MarkPaidRequest {
    method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

impl ApiClient {
    /// Payout history for the authenticated consultant, newest first.
    pub async fn my_payouts(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<Payout>, ApiError> {
        let mut params: Vec<(&str, String)> = vec![];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        self.get_json_with_query("/payouts/me", &params).await
    }

    /// All payouts across consultants (admin only).
    pub async fn admin_list_payouts(&self) -> Result<Vec<Payout>, ApiError> {
        self.get_json("/admin/payouts").await
    }

    /// Generate payouts from eligible commissions over the last `days`
    /// days (admin only, 1..=365 per backend validation).
    pub async fn admin_generate_payouts(&self, days: u32) -> Result<GeneratePayoutsResult, ApiError> {
        self.post_json("/admin/payouts/generate", &GeneratePayoutsRequest { days }).await
    }

    /// Mark a payout as paid out through the given method (admin only).
    pub async fn admin_mark_payout_paid(
        &self,
        payout_id: &str,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json(
            &format!("/admin/payouts/{payout_id}/mark-paid"),
            &MarkPaidRequest { method, reference },
        )
        .await
    }
}
