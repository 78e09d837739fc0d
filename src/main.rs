use {
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    pay_flow::{
        AppState,
        adapters::rest_client::RestClient,
        domain::{
            events::{EventSink, NullSink},
            order::PaymentMode,
            provider::PaymentProvider,
            stores::OrderStore,
        },
        infra::{idempotency::IdempotencyKeys, memory::InMemoryOrders},
        services::{
            handlers::{CaptureCompletedHandler, CheckoutApprovedHandler},
            webhook_engine::WebhookEngine,
        },
    },
    std::{env, sync::Arc, time::Duration},
    tokio::signal,
    tower::ServiceBuilder,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let client_id = env::var("PAY_CLIENT_ID").expect("PAY_CLIENT_ID must be set");
    let client_secret = env::var("PAY_CLIENT_SECRET").expect("PAY_CLIENT_SECRET must be set");
    let mode = env::var("PAY_MODE").unwrap_or_else(|_| "sandbox".to_string());
    let mode = PaymentMode::try_from(mode.as_str()).expect("PAY_MODE must be live or sandbox");
    let webhook_url = env::var("PAY_WEBHOOK_URL").expect("PAY_WEBHOOK_URL must be set");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let provider: Arc<dyn PaymentProvider> =
        Arc::new(RestClient::new(mode, client_id, client_secret));
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrders::new());
    let idempotency = IdempotencyKeys::new();
    let events: Arc<dyn EventSink> = Arc::new(NullSink);

    let mut engine = WebhookEngine::new(Arc::clone(&provider), Arc::clone(&events));
    engine.register(Arc::new(CheckoutApprovedHandler::new(
        Arc::clone(&orders),
        Arc::clone(&provider),
        idempotency.clone(),
    )));
    engine.register(Arc::new(CaptureCompletedHandler::new(
        Arc::clone(&orders),
        Arc::clone(&provider),
    )));
    let engine = Arc::new(engine);

    match engine.ensure_subscription(&webhook_url).await {
        Ok(subscription) => {
            tracing::info!(subscription_id = %subscription.id, "webhook subscription active")
        }
        Err(e) => tracing::error!(error = %e, "webhook subscription registration failed"),
    }

    let state = AppState { engine };

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/webhook", post(pay_flow::adapters::webhook::webhook_handler))
        .layer(ServiceBuilder::new().layer(TimeoutLayer::new(Duration::from_secs(30))))
        .layer(DefaultBodyLimit::max(64 * 1024)) // provider events are small
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
