use {
    super::webhook_engine::WebhookHandler,
    crate::domain::{
        error::{HttpErrorKind, PayError},
        id::RemoteOrderId,
        order::{Intent, LocalOrder},
        provider::PaymentProvider,
        remote::{AuthorizationStatus, RemoteOrderStatus},
        stores::OrderStore,
        webhook::WebhookEvent,
    },
    crate::infra::idempotency::IdempotencyKeys,
    async_trait::async_trait,
    std::sync::Arc,
};

fn not_ours(message: &str) -> serde_json::Value {
    // 2xx with success=false: retrying a delivery we have no order for
    // will never succeed, so don't make the provider retry.
    serde_json::json!({ "success": false, "message": message })
}

fn ok_response() -> serde_json::Value {
    serde_json::json!({ "success": true })
}

/// `CHECKOUT.ORDER.APPROVED`: the buyer approved remotely (possibly after
/// the synchronous checkout flow already gave up); capture if that's what
/// the order wants.
pub struct CheckoutApprovedHandler {
    orders: Arc<dyn OrderStore>,
    provider: Arc<dyn PaymentProvider>,
    idempotency: IdempotencyKeys,
}

impl CheckoutApprovedHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        provider: Arc<dyn PaymentProvider>,
        idempotency: IdempotencyKeys,
    ) -> Self {
        Self {
            orders,
            provider,
            idempotency,
        }
    }

    async fn settle(&self, mut order: LocalOrder, remote_id: RemoteOrderId) -> Result<serde_json::Value, PayError> {
        if order.is_paid() {
            return Ok(ok_response());
        }
        if order.intent() != Some(Intent::Capture) {
            return Ok(ok_response());
        }

        // Deliveries arrive out of order; only the freshly fetched state
        // decides anything.
        let remote = self.provider.fetch_order(&remote_id).await?;
        match remote.status {
            RemoteOrderStatus::Completed => {
                order.mark_paid();
                self.orders.save(&order)?;
                Ok(ok_response())
            }
            RemoteOrderStatus::Approved => {
                let request_id = self.idempotency.get_or_create(order.id());
                match self.provider.capture(&remote_id, request_id).await {
                    Ok(captured) if captured.status == RemoteOrderStatus::Completed => {
                        order.mark_paid();
                        self.orders.save(&order)?;
                        self.idempotency.invalidate(order.id());
                        Ok(ok_response())
                    }
                    Ok(_) => Ok(ok_response()),
                    // A concurrent path won the race; the money moved.
                    Err(PayError::Remote {
                        kind: HttpErrorKind::Conflict,
                        ..
                    }) => {
                        order.mark_paid();
                        self.orders.save(&order)?;
                        Ok(ok_response())
                    }
                    Err(e) => Err(e),
                }
            }
            _ => Ok(not_ours("order not approved")),
        }
    }
}

#[async_trait]
impl WebhookHandler for CheckoutApprovedHandler {
    fn event_types(&self) -> &[&str] {
        &["CHECKOUT.ORDER.APPROVED"]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<serde_json::Value, PayError> {
        let Some(remote_id) = event
            .resource
            .get("id")
            .and_then(|v| v.as_str())
            .map(RemoteOrderId::new)
            .transpose()?
        else {
            return Ok(not_ours("delivery carries no order id"));
        };
        let Some(order) = self.orders.find_by_remote(&remote_id) else {
            return Ok(not_ours("no local order for remote order"));
        };
        self.settle(order, remote_id).await
    }
}

/// `PAYMENT.CAPTURE.COMPLETED`: funds arrived, mark the local order paid.
/// Safe under at-least-once delivery: a second delivery finds the order
/// already paid and changes nothing.
pub struct CaptureCompletedHandler {
    orders: Arc<dyn OrderStore>,
    provider: Arc<dyn PaymentProvider>,
}

impl CaptureCompletedHandler {
    pub fn new(orders: Arc<dyn OrderStore>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { orders, provider }
    }
}

#[async_trait]
impl WebhookHandler for CaptureCompletedHandler {
    fn event_types(&self) -> &[&str] {
        &["PAYMENT.CAPTURE.COMPLETED"]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<serde_json::Value, PayError> {
        let remote_id = event
            .resource
            .pointer("/supplementary_data/related_ids/order_id")
            .and_then(|v| v.as_str())
            .map(RemoteOrderId::new)
            .transpose()?;
        let Some(remote_id) = remote_id else {
            return Ok(not_ours("delivery carries no related order id"));
        };
        let Some(mut order) = self.orders.find_by_remote(&remote_id) else {
            return Ok(not_ours("no local order for remote order"));
        };
        if order.is_paid() {
            return Ok(ok_response());
        }

        // The delivery itself proves nothing; only the provider's current
        // view of the order does.
        let remote = self.provider.fetch_order(&remote_id).await?;
        let funds_collected = remote.status == RemoteOrderStatus::Completed
            || remote
                .purchase_units
                .iter()
                .filter_map(|pu| pu.payments.as_ref())
                .flat_map(|p| p.captures.iter())
                .any(|c| c.status == AuthorizationStatus::Completed);
        if funds_collected {
            order.set_captured(true);
            order.mark_paid();
            self.orders.save(&order)?;
        }
        Ok(ok_response())
    }
}
