//! Checkout Orchestrator
//!
//! Sequences one checkout attempt: precondition checks, order creation,
//! then payment confirmation, in that order and never concurrently.
//! Every failure is converted into [`SubmissionState`] — nothing from
//! this module propagates as a panic or an unhandled error to the view
//! layer. A submission already in flight makes further submit calls
//! no-ops, so a double-click can never issue two orders.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;
use validator::Validate;

use crate::api::models::{
    ConfirmPaymentRequest, CreateOrderRequest, DeliveryAddress, Order, OrderItemRequest,
    PaymentConfirmation, PaymentMethod,
};
use crate::api::{ApiClient, ApiError};
use crate::domain::events::CheckoutEvent;
use crate::stock::{self, ShortfallRecord};
use crate::store::CartStore;

/// Backend calls a submission needs. [`ApiClient`] is the production
/// implementation; tests substitute their own.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError>;
    async fn confirm_payment(&self, request: &ConfirmPaymentRequest) -> Result<PaymentConfirmation, ApiError>;
}

#[async_trait]
impl CheckoutGateway for ApiClient {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        ApiClient::create_order(self, request).await
    }

    async fn confirm_payment(&self, request: &ConfirmPaymentRequest) -> Result<PaymentConfirmation, ApiError> {
        ApiClient::confirm_payment(self, request).await
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Failed,
    Succeeded,
}

/// Transient state of one checkout attempt. `shortfalls` is populated
/// only when the failure is stock-related.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionState {
    pub phase: SubmissionPhase,
    pub shortfalls: Vec<ShortfallRecord>,
    pub error_message: Option<String>,
}

/// Caller-supplied parameters for one submission.
#[derive(Clone, Debug, Default)]
pub struct CheckoutRequest {
    pub points_to_use: i64,
    pub delivery_address: Option<DeliveryAddress>,
    pub method: PaymentMethod,
    /// Payment reference; generated client-side when absent.
    pub reference: Option<String>,
    pub consultant_id: Option<String>,
    pub ref_source: Option<String>,
}

pub struct CheckoutOrchestrator {
    gateway: Arc<dyn CheckoutGateway>,
    state: SubmissionState,
    events: Vec<CheckoutEvent>,
}

impl CheckoutOrchestrator {
    pub fn new(gateway: Arc<dyn CheckoutGateway>) -> Self {
        Self { gateway, state: SubmissionState::default(), events: vec![] }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Back to `Idle` for a fresh session. Not required between retries:
    /// `Failed` re-enters `Submitting` directly on the next submit.
    pub fn reset(&mut self) {
        self.state = SubmissionState::default();
    }

    pub fn take_events(&mut self) -> Vec<CheckoutEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run one submission. Returns the created order on success (the
    /// cart is cleared first); on any failure the outcome is readable
    /// from [`state`](Self::state) and `None` is returned. A call while
    /// a submission is in flight is ignored.
    pub async fn submit(
        &mut self,
        cart: &mut CartStore,
        token: Option<&str>,
        request: CheckoutRequest,
    ) -> Option<Order> {
        if self.state.phase == SubmissionPhase::Submitting {
            tracing::debug!("Submission already in flight, ignoring submit");
            return None;
        }
        self.state = SubmissionState::default();

        let snapshot = cart.snapshot();
        if snapshot.lines.is_empty() {
            self.fail("Cart is empty.", vec![]);
            return None;
        }
        if token.is_none() {
            self.fail("Sign in to complete checkout.", vec![]);
            return None;
        }
        let local_shortfalls = stock::check_local_shortfalls(&snapshot);
        if !local_shortfalls.is_empty() {
            self.fail("Some items exceed available stock. Adjust the cart to continue.", local_shortfalls);
            self.raise(CheckoutEvent::Rejected { stock_related: true });
            return None;
        }
        if let Some(address) = &request.delivery_address {
            if let Err(e) = address.validate() {
                tracing::debug!(error = %e, "Delivery address rejected");
                self.fail("Delivery address is incomplete.", vec![]);
                return None;
            }
        }

        self.state.phase = SubmissionPhase::Submitting;
        self.raise(CheckoutEvent::Submitted);

        let order_request = CreateOrderRequest {
            items: snapshot
                .lines
                .iter()
                .map(|l| OrderItemRequest { product_id: l.product_id.clone(), quantity: l.quantity })
                .collect(),
            points_to_use: request.points_to_use,
            delivery_address: request.delivery_address.clone(),
            consultant_id: request.consultant_id.clone(),
            ref_source: request.ref_source.clone(),
        };

        let order = match self.gateway.create_order(&order_request).await {
            Ok(order) => order,
            Err(e) => {
                self.fail_from_api(e);
                return None;
            }
        };

        // Payment is only attempted once the server has assigned an
        // order id; the two calls are never in flight together.
        let confirm_request = ConfirmPaymentRequest {
            order_id: order.id.clone(),
            amount: order.payable_amount(),
            method: request.method,
            reference: Some(request.reference.clone().unwrap_or_else(|| Uuid::new_v4().to_string())),
        };
        if let Err(e) = self.gateway.confirm_payment(&confirm_request).await {
            self.fail_from_api(e);
            return None;
        }

        cart.clear();
        self.state = SubmissionState { phase: SubmissionPhase::Succeeded, shortfalls: vec![], error_message: None };
        self.raise(CheckoutEvent::Completed { order_id: order.id.clone() });
        tracing::info!(order_id = %order.id, "Checkout completed");
        Some(order)
    }

    fn fail(&mut self, message: &str, shortfalls: Vec<ShortfallRecord>) {
        self.state = SubmissionState {
            phase: SubmissionPhase::Failed,
            shortfalls,
            error_message: Some(message.to_string()),
        };
    }

    fn fail_from_api(&mut self, error: ApiError) {
        match error.body().and_then(stock::parse_backend_shortfalls) {
            Some(records) => {
                tracing::info!(count = records.len(), "Order rejected for insufficient stock");
                self.fail("Insufficient stock for some products.", records);
                self.raise(CheckoutEvent::Rejected { stock_related: true });
            }
            None => {
                tracing::warn!(error = %error, "Checkout failed");
                self.fail("Checkout failed. Please try again.", vec![]);
                self.raise(CheckoutEvent::Rejected { stock_related: false });
            }
        }
    }

    fn raise(&mut self, event: CheckoutEvent) {
        self.events.push(event);
    }

    #[cfg(test)]
    fn force_submitting(&mut self) {
        self.state.phase = SubmissionPhase::Submitting;
    }
}
