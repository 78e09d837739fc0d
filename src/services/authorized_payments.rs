use {
    crate::domain::{
        error::PayError,
        events::{DomainEvent, EventSink},
        order::LocalOrder,
        provider::PaymentProvider,
        remote::RemoteOrder,
        stores::OrderStore,
    },
    crate::infra::idempotency::IdempotencyKeys,
    std::sync::Arc,
};

/// Outcome of a capture attempt against a previously authorized order.
/// `AlreadyCaptured` is the common re-entry case: webhook deliveries and
/// the deferred checker may both try, and only the first one charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Successful,
    AlreadyCaptured,
    Failed,
    Inaccessible,
    NotFound,
}

/// Captures or voids a previously authorized (not yet captured) payment,
/// idempotently.
pub struct AuthorizedPayments {
    provider: Arc<dyn PaymentProvider>,
    orders: Arc<dyn OrderStore>,
    idempotency: IdempotencyKeys,
    events: Arc<dyn EventSink>,
}

impl AuthorizedPayments {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        orders: Arc<dyn OrderStore>,
        idempotency: IdempotencyKeys,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            provider,
            orders,
            idempotency,
            events,
        }
    }

    pub async fn capture(&self, order: &mut LocalOrder) -> Result<CaptureStatus, PayError> {
        let remote_id = order.remote_order_id().cloned().ok_or_else(|| {
            PayError::PreconditionFailed(format!(
                "order {} has no remote order recorded",
                order.id()
            ))
        })?;

        let remote = match self.provider.fetch_order(&remote_id).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => return Ok(CaptureStatus::NotFound),
            Err(_) => return Ok(CaptureStatus::Inaccessible),
        };

        let capturable = remote.capturable_authorizations();
        if capturable.is_empty() {
            return Ok(CaptureStatus::AlreadyCaptured);
        }

        let request_id = self.idempotency.get_or_create(order.id());
        for authorization in capturable {
            if self
                .provider
                .capture_authorization(&authorization.id, request_id)
                .await
                .is_err()
            {
                return Ok(CaptureStatus::Failed);
            }
        }

        order.set_captured(true);
        order.mark_paid();
        self.orders.save(order)?;
        self.idempotency.invalidate(order.id());
        self.events.publish(DomainEvent::PaymentCaptured {
            order_id: order.id(),
        });
        Ok(CaptureStatus::Successful)
    }

    /// Full cancellation: release every capturable hold on the order.
    pub async fn void(&self, order: &LocalOrder, remote: &RemoteOrder) -> Result<(), PayError> {
        let request_id = self.idempotency.get_or_create(order.id());
        for authorization in remote.capturable_authorizations() {
            self.provider
                .void_authorization(&authorization.id, request_id)
                .await
                .map_err(|e| PayError::OperationFailed(format!("void failed: {e}")))?;
        }
        self.events.publish(DomainEvent::AuthorizationVoided {
            order_id: order.id(),
        });
        Ok(())
    }
}
