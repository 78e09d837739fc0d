mod common;

use async_trait::async_trait;
use common::*;
use pay_flow::domain::error::PayError;
use pay_flow::domain::events::EventSink;
use pay_flow::domain::id::EventId;
use pay_flow::domain::order::{Intent, PaymentMethod};
use pay_flow::domain::provider::PaymentProvider;
use pay_flow::domain::remote::RemoteOrderStatus;
use pay_flow::domain::stores::OrderStore;
use pay_flow::domain::webhook::WebhookEvent;
use pay_flow::services::handlers::CaptureCompletedHandler;
use pay_flow::services::webhook_engine::{WebhookEngine, WebhookHandler};
use std::sync::{Arc, Mutex};

/// Records every invocation and answers with a fixed payload.
struct RecordingHandler {
    types: &'static [&'static str],
    hits: Mutex<Vec<EventId>>,
}

impl RecordingHandler {
    fn new(types: &'static [&'static str]) -> Arc<Self> {
        Arc::new(Self {
            types,
            hits: Mutex::new(Vec::new()),
        })
    }

    fn hits(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookHandler for RecordingHandler {
    fn event_types(&self) -> &[&str] {
        self.types
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<serde_json::Value, PayError> {
        self.hits.lock().unwrap().push(event.id.clone());
        Ok(serde_json::json!({ "success": true, "handled": event.event_type }))
    }
}

fn engine_with(
    provider: &Arc<MockProvider>,
    sink: &Arc<BufferSink>,
    handlers: &[Arc<dyn WebhookHandler>],
) -> WebhookEngine {
    let provider_dyn: Arc<dyn PaymentProvider> = provider.clone();
    let sink_dyn: Arc<dyn EventSink> = sink.clone();
    let mut engine = WebhookEngine::new(provider_dyn, sink_dyn);
    for handler in handlers {
        engine.register(handler.clone());
    }
    engine
}

// ── dispatch ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn verified_delivery_reaches_the_matching_handler() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);
    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();

    let transmission = make_transmission(
        "WH-1",
        "CHECKOUT.ORDER.APPROVED",
        serde_json::json!({ "id": "RO-40" }),
    );
    let response = engine.process(&transmission).await.unwrap();

    assert_eq!(response["handled"], "CHECKOUT.ORDER.APPROVED");
    assert_eq!(handler.hits(), 1);
    assert_eq!(provider.calls("verify"), 1);
    assert_eq!(
        engine.last_seen().unwrap().id,
        EventId::new("WH-1").unwrap()
    );
}

#[tokio::test]
async fn unmatched_event_type_names_the_type_and_invokes_nothing() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);
    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();

    let transmission = make_transmission(
        "WH-2",
        "PAYMENT.SALE.REFUNDED",
        serde_json::json!({}),
    );
    let err = engine.process(&transmission).await.unwrap_err();

    match err {
        PayError::UnhandledEventType(event_type) => {
            assert_eq!(event_type, "PAYMENT.SALE.REFUNDED")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(handler.hits(), 0);
}

// ── verification ───────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_signature_check_rejects_the_delivery() {
    let provider = Arc::new(MockProvider::new());
    provider.set_verify(false);
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);
    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();

    let transmission = make_transmission(
        "WH-3",
        "CHECKOUT.ORDER.APPROVED",
        serde_json::json!({ "id": "RO-41" }),
    );
    let err = engine.process(&transmission).await.unwrap_err();
    assert!(matches!(err, PayError::VerificationFailed(_)));
    assert_eq!(handler.hits(), 0);
}

#[tokio::test]
async fn delivery_without_a_registered_subscription_is_rejected() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);

    let transmission = make_transmission(
        "WH-4",
        "CHECKOUT.ORDER.APPROVED",
        serde_json::json!({ "id": "RO-42" }),
    );
    let err = engine.process(&transmission).await.unwrap_err();
    assert!(matches!(err, PayError::VerificationFailed(_)));
    assert_eq!(provider.calls("verify"), 0);
}

// The host may ask for verification repeatedly while serving one delivery;
// the provider is only asked once.

#[tokio::test]
async fn verification_result_is_memoized_within_a_request() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);
    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();

    let transmission = make_transmission(
        "WH-5",
        "CHECKOUT.ORDER.APPROVED",
        serde_json::json!({ "id": "RO-43" }),
    );
    assert!(engine.verify_delivery(&transmission).await.unwrap());
    assert!(engine.verify_delivery(&transmission).await.unwrap());
    assert_eq!(provider.calls("verify"), 1);
}

#[tokio::test]
async fn simulated_event_bypasses_signature_verification() {
    let provider = Arc::new(MockProvider::new());
    provider.set_verify(false); // would reject if verification ran
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);
    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();

    engine.start_simulation(EventId::new("WH-6").unwrap());
    let transmission = make_transmission(
        "WH-6",
        "CHECKOUT.ORDER.APPROVED",
        serde_json::json!({ "id": "RO-44" }),
    );
    engine.process(&transmission).await.unwrap();

    assert_eq!(provider.calls("verify"), 0);
    assert_eq!(handler.hits(), 1);
}

// ── at-least-once delivery ─────────────────────────────────────────────────
// Two deliveries with the same event id are each verified and dispatched;
// the handler must converge to the same end state.

#[tokio::test]
async fn redelivered_capture_completed_is_idempotent() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let orders = Arc::new(pay_flow::infra::memory::InMemoryOrders::new());

    let remote = make_remote_order("RO-45", Intent::Capture, RemoteOrderStatus::Completed, 5000);
    provider.insert_order(remote);
    let mut order = make_order(5000, PaymentMethod::Card);
    order.record_remote(remote_id("RO-45"), Intent::Capture);
    orders.save(&order).unwrap();

    let orders_dyn: Arc<dyn OrderStore> = orders.clone();
    let provider_dyn: Arc<dyn PaymentProvider> = provider.clone();
    let handler: Arc<dyn WebhookHandler> =
        Arc::new(CaptureCompletedHandler::new(orders_dyn, provider_dyn));
    let engine = engine_with(&provider, &sink, &[handler]);
    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();

    let resource = serde_json::json!({
        "id": "CAP-1",
        "supplementary_data": { "related_ids": { "order_id": "RO-45" } },
    });
    let first = make_transmission("WH-7", "PAYMENT.CAPTURE.COMPLETED", resource.clone());
    let second = make_transmission("WH-7", "PAYMENT.CAPTURE.COMPLETED", resource);

    engine.process(&first).await.unwrap();
    let after_first = orders.get(order.id()).unwrap();
    assert!(after_first.is_paid());

    engine.process(&second).await.unwrap();
    let after_second = orders.get(order.id()).unwrap();
    assert!(after_second.is_paid());
    assert_eq!(after_first.status(), after_second.status());
    // Each delivery was independently verified, no cross-request dedupe.
    assert_eq!(provider.calls("verify"), 2);
}

// ── subscription reconciliation ────────────────────────────────────────────

#[tokio::test]
async fn subscription_is_replaced_when_the_url_changes() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);

    let first = engine.ensure_subscription("https://old.test/webhook").await.unwrap();
    // Same url and event types: nothing to do.
    let same = engine.ensure_subscription("https://old.test/webhook").await.unwrap();
    assert_eq!(first, same);
    assert_eq!(provider.calls("create_webhook"), 1);

    let replaced = engine.ensure_subscription("https://new.test/webhook").await.unwrap();
    assert_ne!(first.id, replaced.id);
    assert_eq!(provider.calls("delete_webhook"), 1);
    assert_eq!(provider.calls("create_webhook"), 2);
    assert_eq!(provider.subscriptions().len(), 1);
}

#[tokio::test]
async fn deactivation_deletes_the_subscription() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(BufferSink::new());
    let handler = RecordingHandler::new(&["CHECKOUT.ORDER.APPROVED"]);
    let engine = engine_with(&provider, &sink, &[handler.clone()]);

    engine.ensure_subscription("https://shop.test/webhook").await.unwrap();
    engine.deactivate().await.unwrap();
    assert!(provider.subscriptions().is_empty());
    assert!(engine.subscription().is_none());
}
