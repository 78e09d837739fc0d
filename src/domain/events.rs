use {
    super::id::{EventId, OrderId},
    super::order::Intent,
    super::settings::VaultFailurePolicy,
};

/// Domain events the core emits. The orchestration layer wires subscribers;
/// the core does not know who listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    OrderProcessed { order_id: OrderId, intent: Intent },
    PaymentCaptured { order_id: OrderId },
    AuthorizationVoided { order_id: OrderId },
    VaultingFailed {
        order_id: OrderId,
        policy: VaultFailurePolicy,
    },
    WebhookDispatched {
        event_id: EventId,
        event_type: String,
    },
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Discards everything; the default when nothing is wired.
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: DomainEvent) {}
}
