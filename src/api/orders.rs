//! Order endpoints

use super::models::{CreateOrderRequest, Order};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Create an order from cart items. A rejection for insufficient
    /// stock carries a shortfall body; feed [`ApiError::body`] to
    /// [`crate::stock::parse_backend_shortfalls`].
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        self.post_json("/orders/", request).await
    }

    /// Order history for the authenticated user, newest first.
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_json("/orders/me").await
    }
}
