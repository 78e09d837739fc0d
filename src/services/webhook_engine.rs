//! Inbound delivery processing. Each delivery moves through
//! received → verified → dispatched, or is rejected at verification.
//! Deliveries are not deduplicated across requests; the provider may
//! redeliver, and handlers are required to be idempotent.

use {
    crate::domain::{
        error::PayError,
        events::{DomainEvent, EventSink},
        id::EventId,
        provider::PaymentProvider,
        webhook::{LastEvent, WebhookEvent, WebhookSubscription, WebhookTransmission},
    },
    async_trait::async_trait,
    std::collections::HashMap,
    std::sync::{Arc, Mutex},
};

#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Event types this handler consumes. The first registered handler
    /// whose set matches a delivery wins.
    fn event_types(&self) -> &[&str];

    /// The returned payload goes back to the provider verbatim and governs
    /// its retry behavior.
    async fn handle(&self, event: &WebhookEvent) -> Result<serde_json::Value, PayError>;
}

pub struct WebhookEngine {
    provider: Arc<dyn PaymentProvider>,
    handlers: Vec<Arc<dyn WebhookHandler>>,
    subscription: Mutex<Option<WebhookSubscription>>,
    simulation: Mutex<Option<EventId>>,
    last_seen: Mutex<Option<LastEvent>>,
    // The host may ask for verification several times while serving one
    // delivery; the memo lives for that request and is dropped at the end.
    verification_memo: Mutex<HashMap<EventId, bool>>,
    events: Arc<dyn EventSink>,
}

impl WebhookEngine {
    pub fn new(provider: Arc<dyn PaymentProvider>, events: Arc<dyn EventSink>) -> Self {
        Self {
            provider,
            handlers: Vec::new(),
            subscription: Mutex::new(None),
            simulation: Mutex::new(None),
            last_seen: Mutex::new(None),
            verification_memo: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn register(&mut self, handler: Arc<dyn WebhookHandler>) {
        self.handlers.push(handler);
    }

    /// Union of every handler's declared event types, deduplicated and
    /// sorted. This is what the remote subscription asks for.
    pub fn handler_event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .iter()
            .flat_map(|h| h.event_types().iter().map(|t| t.to_string()))
            .collect();
        types.sort();
        types.dedup();
        types
    }

    pub fn subscription(&self) -> Option<WebhookSubscription> {
        self.subscription.lock().expect("subscription poisoned").clone()
    }

    /// Create the remote subscription, replacing any stored one whose
    /// callback url or event-type set no longer matches.
    pub async fn ensure_subscription(
        &self,
        url: &str,
    ) -> Result<WebhookSubscription, PayError> {
        let wanted = self.handler_event_types();
        let current = self.subscription();
        if let Some(existing) = current {
            if existing.url == url && existing.event_types == wanted {
                return Ok(existing);
            }
            self.provider.delete_webhook(&existing.id).await?;
        }
        let created = self.provider.create_webhook(url, &wanted).await?;
        *self.subscription.lock().expect("subscription poisoned") = Some(created.clone());
        Ok(created)
    }

    /// Drop the remote subscription (merchant deactivated the integration).
    pub async fn deactivate(&self) -> Result<(), PayError> {
        let existing = self
            .subscription
            .lock()
            .expect("subscription poisoned")
            .take();
        if let Some(subscription) = existing {
            self.provider.delete_webhook(&subscription.id).await?;
        }
        Ok(())
    }

    /// Arm the simulation: the next delivery carrying this event id is
    /// trusted without signature verification.
    pub fn start_simulation(&self, event_id: EventId) {
        *self.simulation.lock().expect("simulation poisoned") = Some(event_id);
    }

    pub fn last_seen(&self) -> Option<LastEvent> {
        self.last_seen.lock().expect("last event poisoned").clone()
    }

    /// Signature check, memoized per event id for the current request.
    pub async fn verify_delivery(
        &self,
        transmission: &WebhookTransmission,
    ) -> Result<bool, PayError> {
        let event_id = &transmission.event.id;
        if let Some(&cached) = self
            .verification_memo
            .lock()
            .expect("verification memo poisoned")
            .get(event_id)
        {
            return Ok(cached);
        }

        let subscription_id = self
            .subscription()
            .map(|s| s.id)
            .ok_or_else(|| {
                PayError::VerificationFailed("no registered webhook subscription".into())
            })?;
        let verified = self
            .provider
            .verify_webhook_signature(transmission, &subscription_id)
            .await?;
        self.verification_memo
            .lock()
            .expect("verification memo poisoned")
            .insert(event_id.clone(), verified);
        Ok(verified)
    }

    /// Run one delivery through verification and dispatch. The returned
    /// payload is the matched handler's response, verbatim.
    pub async fn process(
        &self,
        transmission: &WebhookTransmission,
    ) -> Result<serde_json::Value, PayError> {
        let event = &transmission.event;

        let simulated = {
            let mut simulation = self.simulation.lock().expect("simulation poisoned");
            if simulation.as_ref() == Some(&event.id) {
                simulation.take();
                true
            } else {
                false
            }
        };

        if !simulated {
            let verified = self.verify_delivery(transmission).await;
            self.verification_memo
                .lock()
                .expect("verification memo poisoned")
                .remove(&event.id);
            if !verified? {
                return Err(PayError::VerificationFailed(format!(
                    "signature check failed for {}",
                    event.id
                )));
            }
        }

        *self.last_seen.lock().expect("last event poisoned") = Some(LastEvent {
            id: event.id.clone(),
            received_at: event.received_at,
        });

        let handler = self
            .handlers
            .iter()
            .find(|h| h.event_types().contains(&event.event_type.as_str()))
            .ok_or_else(|| PayError::UnhandledEventType(event.event_type.clone()))?;

        let response = handler.handle(event).await?;
        self.events.publish(DomainEvent::WebhookDispatched {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
        });
        Ok(response)
    }
}
