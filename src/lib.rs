//! ARCA Client
//!
//! Client library for the ARCA commerce and loyalty platform: product
//! browsing, a locally persisted shopping cart, checkout with stock
//! reconciliation, order history, and the consultant commission/payout
//! surfaces. All pricing, stock truth, and commission math live in the
//! backend; this crate owns presentation-side state and request
//! orchestration.
//!
//! ## Layout
//! - [`store`] — the cart store: optimistic local state, persisted on
//!   every mutation
//! - [`stock`] — reconciliation of requested quantities against known
//!   availability, local and backend-reported
//! - [`checkout`] — the submission state machine (order creation, then
//!   payment confirmation)
//! - [`api`] — typed HTTP surface of the backend
//! - [`storage`] — durable key-value records (cart, token)

use thiserror::Error;

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod stock;
pub mod storage;
pub mod store;

pub use api::ApiClient;
pub use auth::AuthSession;
pub use checkout::{CheckoutOrchestrator, CheckoutRequest, SubmissionPhase, SubmissionState};
pub use config::Config;
pub use domain::aggregates::{Cart, CartLine};
pub use domain::value_objects::Money;
pub use stock::{check_local_shortfalls, parse_backend_shortfalls, ShortfallRecord};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{CartSnapshot, CartStore};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Not authenticated")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, ClientError>;
