//! Wire models for the ARCA backend
//!
//! Shapes mirror the backend's response schemas. Enum values travel as
//! lowercase/snake_case strings on the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::aggregates::CartLine;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub stock: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The single extraction rule for the cart's stock hint: the
    /// catalog's `stock` field, floored at zero.
    pub fn available_stock(&self) -> u32 {
        self.stock.clamp(0, u32::MAX as i64) as u32
    }

    /// Snapshot this product into a cart line. Name and price are
    /// captured now and not re-synced if the catalog changes later.
    pub fn to_cart_line(&self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: Money::mzn(self.price),
            quantity,
            available_stock: Some(self.available_stock()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Completed,
    Canceled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub points_used: i64,
    #[serde(default)]
    pub points_earned: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Amount actually due after the points discount; the value the
    /// payment confirmation must carry.
    pub fn payable_amount(&self) -> Decimal {
        self.total_amount - self.discount_amount
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    Consultant,
    Staff,
    Admin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserLevel {
    #[default]
    Bronze,
    Prata,
    Ouro,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub level: UserLevel,
    pub points_balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Bearer token issued by `/auth/login` and `/auth/register`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    Consultant,
    UplineLevel1,
    UplineLevel2,
    UplineLevel3,
    StaffPool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: String,
    pub order_id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: CommissionType,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    #[default]
    Pending,
    Processed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub amount: Decimal,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Delivery address collected at checkout. Field rules follow the
/// storefront form: everything but WhatsApp is required.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct DeliveryAddress {
    #[validate(length(min = 1, message = "recipient name is required"))]
    pub recipient_name: String,
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "province is required"))]
    pub province: String,
    #[validate(length(min = 1, message = "district is required"))]
    pub district: String,
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub points_to_use: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_source: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Mpesa,
    Emola,
    Bank,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Response of `/payments/confirm`. The already-paid idempotent reply
/// omits method/reference/amount, so those stay optional.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentConfirmation {
    pub ok: bool,
    pub status: OrderStatus,
    pub order_id: String,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: UserRole,
}
