#![allow(dead_code)]

use {
    async_trait::async_trait,
    pay_flow::domain::{
        error::{HttpErrorKind, PayError},
        events::{DomainEvent, EventSink},
        id::{AuthorizationId, OrderId, RemoteOrderId, SubscriptionId},
        money::{Currency, Money, MoneyAmount},
        order::{Intent, LocalOrder, PaymentMethod, PaymentMode},
        provider::PaymentProvider,
        remote::{
            Authorization, AuthorizationStatus, Capture, CardAuthenticationResult, CardDetails,
            Item, ItemCategory, LiabilityShift, PaymentSource, PurchaseUnit,
            PurchaseUnitPayments, RemoteOrder, RemoteOrderStatus,
        },
        settings::Settings,
        stores::{OrderStore, SubscriptionStore, TokenStore},
        webhook::{WebhookEvent, WebhookSubscription, WebhookTransmission},
    },
    pay_flow::infra::{
        idempotency::IdempotencyKeys,
        memory::{CheckoutSession, InMemoryOrders, InMemorySubscriptions, InMemoryTokens},
        scheduler::{Scheduler, Task},
    },
    pay_flow::services::{
        authorized_payments::AuthorizedPayments,
        processor::OrderProcessor,
        vault_check::VaultCheck,
    },
    std::collections::HashMap,
    std::sync::{Arc, Mutex},
    std::time::Duration,
    uuid::Uuid,
};

// ── Builders ───────────────────────────────────────────────────────────────

pub fn usd(minor_units: i64) -> Money {
    Money::new(MoneyAmount::new(minor_units).unwrap(), Currency::Usd)
}

pub fn make_order(total_minor: i64, method: PaymentMethod) -> LocalOrder {
    LocalOrder::new(
        OrderId::generate(),
        Some("cust-1".to_string()),
        usd(total_minor),
        method,
        PaymentMode::Sandbox,
    )
}

pub fn remote_id(id: &str) -> RemoteOrderId {
    RemoteOrderId::new(id).unwrap()
}

pub fn auth_id(id: &str) -> AuthorizationId {
    AuthorizationId::new(id).unwrap()
}

pub fn make_remote_order(
    id: &str,
    intent: Intent,
    status: RemoteOrderStatus,
    total_minor: i64,
) -> RemoteOrder {
    RemoteOrder {
        id: remote_id(id),
        intent,
        status,
        purchase_units: vec![PurchaseUnit::new("default", usd(total_minor))],
        payment_source: None,
    }
}

pub fn with_authorization(
    mut order: RemoteOrder,
    auth: &str,
    status: AuthorizationStatus,
) -> RemoteOrder {
    order.purchase_units[0]
        .payments
        .get_or_insert_with(PurchaseUnitPayments::default)
        .authorizations
        .push(Authorization {
            id: auth_id(auth),
            status,
        });
    order
}

pub fn with_item(mut order: RemoteOrder, name: &str, category: ItemCategory) -> RemoteOrder {
    order.purchase_units[0].items.push(Item {
        name: name.to_string(),
        category,
    });
    order
}

pub fn with_card_source(
    mut order: RemoteOrder,
    liability_shift: Option<LiabilityShift>,
    authentication_status: Option<&str>,
) -> RemoteOrder {
    order.payment_source = Some(PaymentSource {
        card: Some(CardDetails {
            last_digits: Some("1111".to_string()),
            authentication_result: Some(CardAuthenticationResult {
                liability_shift,
                authentication_status: authentication_status.map(str::to_string),
            }),
        }),
    });
    order
}

pub fn make_transmission(
    event_id: &str,
    event_type: &str,
    resource: serde_json::Value,
) -> WebhookTransmission {
    let body = serde_json::json!({
        "id": event_id,
        "event_type": event_type,
        "resource_type": "checkout-order",
        "resource": resource,
    })
    .to_string();
    let event = WebhookEvent::from_body(&body, chrono::Utc::now()).unwrap();
    WebhookTransmission {
        transmission_id: "trans-1".to_string(),
        transmission_time: "2026-01-01T00:00:00Z".to_string(),
        transmission_sig: "sig".to_string(),
        cert_url: "https://example.test/cert".to_string(),
        auth_algo: "SHA256withRSA".to_string(),
        body,
        event,
    }
}

// ── Scripted provider ──────────────────────────────────────────────────────

/// Behavioral stand-in for the REST client: holds remote orders in memory,
/// mutates them the way the provider would, and counts every call.
#[derive(Default)]
pub struct MockProvider {
    orders: Mutex<HashMap<RemoteOrderId, RemoteOrder>>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, HttpErrorKind>>,
    verify_ok: Mutex<bool>,
    subscriptions: Mutex<Vec<WebhookSubscription>>,
    subscription_seq: Mutex<u32>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            verify_ok: Mutex::new(true),
            ..Default::default()
        }
    }

    pub fn insert_order(&self, order: RemoteOrder) {
        self.orders.lock().unwrap().insert(order.id.clone(), order);
    }

    pub fn order(&self, id: &RemoteOrderId) -> Option<RemoteOrder> {
        self.orders.lock().unwrap().get(id).cloned()
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    /// Make every call of `name` fail with the given kind.
    pub fn fail(&self, name: &'static str, kind: HttpErrorKind) {
        self.failures.lock().unwrap().insert(name, kind);
    }

    pub fn set_verify(&self, ok: bool) {
        *self.verify_ok.lock().unwrap() = ok;
    }

    pub fn subscriptions(&self) -> Vec<WebhookSubscription> {
        self.subscriptions.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) -> Result<(), PayError> {
        self.calls.lock().unwrap().push(name);
        if let Some(kind) = self.failures.lock().unwrap().get(name) {
            return Err(PayError::remote(*kind, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn fetch_order(&self, id: &RemoteOrderId) -> Result<RemoteOrder, PayError> {
        self.record("fetch_order")?;
        self.order(id)
            .ok_or_else(|| PayError::remote(HttpErrorKind::NotFound, "no such order"))
    }

    async fn patch_order(
        &self,
        current: &RemoteOrder,
        units: Vec<PurchaseUnit>,
        _request_id: Uuid,
    ) -> Result<RemoteOrder, PayError> {
        self.record("patch_order")?;
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .get_mut(&current.id)
            .ok_or_else(|| PayError::remote(HttpErrorKind::NotFound, "no such order"))?;
        for (unit, incoming) in stored.purchase_units.iter_mut().zip(units) {
            unit.amount = incoming.amount;
        }
        Ok(stored.clone())
    }

    async fn capture(
        &self,
        id: &RemoteOrderId,
        _request_id: Uuid,
    ) -> Result<RemoteOrder, PayError> {
        self.record("capture")?;
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .get_mut(id)
            .ok_or_else(|| PayError::remote(HttpErrorKind::NotFound, "no such order"))?;
        stored.status = RemoteOrderStatus::Completed;
        stored.purchase_units[0]
            .payments
            .get_or_insert_with(PurchaseUnitPayments::default)
            .captures
            .push(Capture {
                id: "CAP-1".to_string(),
                status: AuthorizationStatus::Completed,
            });
        Ok(stored.clone())
    }

    async fn authorize(
        &self,
        id: &RemoteOrderId,
        _request_id: Uuid,
    ) -> Result<RemoteOrder, PayError> {
        self.record("authorize")?;
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .get_mut(id)
            .ok_or_else(|| PayError::remote(HttpErrorKind::NotFound, "no such order"))?;
        stored.purchase_units[0]
            .payments
            .get_or_insert_with(PurchaseUnitPayments::default)
            .authorizations
            .push(Authorization {
                id: auth_id("AUTH-1"),
                status: AuthorizationStatus::Created,
            });
        Ok(stored.clone())
    }

    async fn capture_authorization(
        &self,
        id: &AuthorizationId,
        _request_id: Uuid,
    ) -> Result<Authorization, PayError> {
        self.record("capture_authorization")?;
        let mut orders = self.orders.lock().unwrap();
        for order in orders.values_mut() {
            for unit in &mut order.purchase_units {
                if let Some(payments) = unit.payments.as_mut() {
                    for authorization in &mut payments.authorizations {
                        if authorization.id == *id {
                            authorization.status = AuthorizationStatus::Completed;
                            return Ok(authorization.clone());
                        }
                    }
                }
            }
        }
        Err(PayError::remote(HttpErrorKind::NotFound, "no such authorization"))
    }

    async fn void_authorization(
        &self,
        id: &AuthorizationId,
        _request_id: Uuid,
    ) -> Result<(), PayError> {
        self.record("void_authorization")?;
        let mut orders = self.orders.lock().unwrap();
        for order in orders.values_mut() {
            for unit in &mut order.purchase_units {
                if let Some(payments) = unit.payments.as_mut() {
                    for authorization in &mut payments.authorizations {
                        if authorization.id == *id {
                            authorization.status = AuthorizationStatus::Voided;
                            return Ok(());
                        }
                    }
                }
            }
        }
        Err(PayError::remote(HttpErrorKind::NotFound, "no such authorization"))
    }

    async fn create_webhook(
        &self,
        url: &str,
        event_types: &[String],
    ) -> Result<WebhookSubscription, PayError> {
        self.record("create_webhook")?;
        let mut seq = self.subscription_seq.lock().unwrap();
        *seq += 1;
        let subscription = WebhookSubscription {
            id: SubscriptionId::new(format!("SUB-{}", *seq)).unwrap(),
            url: url.to_string(),
            event_types: event_types.to_vec(),
        };
        self.subscriptions.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    async fn delete_webhook(&self, id: &SubscriptionId) -> Result<(), PayError> {
        self.record("delete_webhook")?;
        self.subscriptions.lock().unwrap().retain(|s| s.id != *id);
        Ok(())
    }

    async fn verify_webhook_signature(
        &self,
        _transmission: &WebhookTransmission,
        _subscription_id: &SubscriptionId,
    ) -> Result<bool, PayError> {
        self.record("verify")?;
        Ok(*self.verify_ok.lock().unwrap())
    }
}

// ── Event sink / scheduler doubles ─────────────────────────────────────────

#[derive(Default)]
pub struct BufferSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl EventSink for BufferSink {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Swallows scheduled tasks; vault-check tests call `run` directly.
pub struct DropScheduler;

impl Scheduler for DropScheduler {
    fn schedule(&self, _delay: Duration, _task: Task) {}
}

// ── Wired service stack ────────────────────────────────────────────────────

pub struct Stack {
    pub provider: Arc<MockProvider>,
    pub orders: Arc<InMemoryOrders>,
    pub subscriptions: Arc<InMemorySubscriptions>,
    pub tokens: Arc<InMemoryTokens>,
    pub idempotency: IdempotencyKeys,
    pub sink: Arc<BufferSink>,
    pub session: CheckoutSession,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(MockProvider::new()),
            orders: Arc::new(InMemoryOrders::new()),
            subscriptions: Arc::new(InMemorySubscriptions::new()),
            tokens: Arc::new(InMemoryTokens::new()),
            idempotency: IdempotencyKeys::new(),
            sink: Arc::new(BufferSink::new()),
            session: CheckoutSession::new(),
        }
    }

    fn provider_dyn(&self) -> Arc<dyn PaymentProvider> {
        self.provider.clone()
    }

    fn orders_dyn(&self) -> Arc<dyn OrderStore> {
        self.orders.clone()
    }

    fn sink_dyn(&self) -> Arc<dyn EventSink> {
        self.sink.clone()
    }

    pub fn authorized(&self) -> Arc<AuthorizedPayments> {
        Arc::new(AuthorizedPayments::new(
            self.provider_dyn(),
            self.orders_dyn(),
            self.idempotency.clone(),
            self.sink_dyn(),
        ))
    }

    pub fn vault_check(&self, settings: Settings) -> Arc<VaultCheck> {
        let subscriptions: Arc<dyn SubscriptionStore> = self.subscriptions.clone();
        let tokens: Arc<dyn TokenStore> = self.tokens.clone();
        Arc::new(VaultCheck::new(
            self.provider_dyn(),
            self.orders_dyn(),
            subscriptions,
            tokens,
            self.authorized(),
            settings,
            self.sink_dyn(),
        ))
    }

    pub fn processor(&self, settings: Settings) -> OrderProcessor {
        OrderProcessor::new(
            self.provider_dyn(),
            self.orders_dyn(),
            self.idempotency.clone(),
            settings,
            self.authorized(),
            self.vault_check(settings),
            self.session.clone(),
            Arc::new(DropScheduler),
            self.sink_dyn(),
        )
    }
}
