//! Product catalog endpoints

use super::models::Product;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// List active catalog products. The `stock` field of each product
    /// is the source of the cart's available-stock hints.
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/products/").await
    }

    /// Fetch a single active product by id.
    pub async fn get_product(&self, product_id: &str) -> Result<Product, ApiError> {
        self.get_json(&format!("/products/{product_id}")).await
    }
}
