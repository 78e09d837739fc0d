use {
    super::error::PayError,
    super::id::{AuthorizationId, RemoteOrderId, SubscriptionId},
    super::remote::{Authorization, PurchaseUnit, RemoteOrder},
    super::webhook::{WebhookSubscription, WebhookTransmission},
    async_trait::async_trait,
    uuid::Uuid,
};

/// Typed surface of the provider's order/payment/webhook REST resources.
/// Pure request/response mapping, no business logic behind this trait.
///
/// Every mutating call takes the caller's current idempotency key
/// (`request_id`) so a client-side retry cannot double-charge.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn fetch_order(&self, id: &RemoteOrderId) -> Result<RemoteOrder, PayError>;

    /// Replace the order's purchase units with locally-derived ones and
    /// return the updated order.
    async fn patch_order(
        &self,
        current: &RemoteOrder,
        units: Vec<PurchaseUnit>,
        request_id: Uuid,
    ) -> Result<RemoteOrder, PayError>;

    async fn capture(
        &self,
        id: &RemoteOrderId,
        request_id: Uuid,
    ) -> Result<RemoteOrder, PayError>;

    async fn authorize(
        &self,
        id: &RemoteOrderId,
        request_id: Uuid,
    ) -> Result<RemoteOrder, PayError>;

    async fn capture_authorization(
        &self,
        id: &AuthorizationId,
        request_id: Uuid,
    ) -> Result<Authorization, PayError>;

    async fn void_authorization(
        &self,
        id: &AuthorizationId,
        request_id: Uuid,
    ) -> Result<(), PayError>;

    async fn create_webhook(
        &self,
        url: &str,
        event_types: &[String],
    ) -> Result<WebhookSubscription, PayError>;

    async fn delete_webhook(&self, id: &SubscriptionId) -> Result<(), PayError>;

    /// Ask the provider whether a delivery's signature matches the
    /// registered subscription.
    async fn verify_webhook_signature(
        &self,
        transmission: &WebhookTransmission,
        subscription_id: &SubscriptionId,
    ) -> Result<bool, PayError>;
}
