//! Payment endpoints

use super::models::{ConfirmPaymentRequest, PaymentConfirmation};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Confirm payment for an order. The backend requires `amount` to
    /// equal the order's payable amount (total minus points discount)
    /// and replies idempotently when the order is already paid.
    pub async fn confirm_payment(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<PaymentConfirmation, ApiError> {
        self.post_json("/payments/confirm", request).await
    }
}
