use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{error::PayError, webhook::{WebhookEvent, WebhookTransmission}},
    },
    axum::{Json, extract::State, http::HeaderMap},
    chrono::Utc,
};

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, PayError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| PayError::VerificationFailed(format!("missing {name} header")))
}

pub fn parse_transmission(headers: &HeaderMap, body: String) -> Result<WebhookTransmission, PayError> {
    let event = WebhookEvent::from_body(&body, Utc::now())?;
    Ok(WebhookTransmission {
        transmission_id: required_header(headers, "paypal-transmission-id")?,
        transmission_time: required_header(headers, "paypal-transmission-time")?,
        transmission_sig: required_header(headers, "paypal-transmission-sig")?,
        cert_url: required_header(headers, "paypal-cert-url")?,
        auth_algo: required_header(headers, "paypal-auth-algo")?,
        body,
        event,
    })
}

#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(event_id = tracing::field::Empty, event_type = tracing::field::Empty)
)]
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let transmission = parse_transmission(&headers, body)?;

    // Add event context to the span so all subsequent logs are correlated.
    tracing::Span::current()
        .record("event_id", tracing::field::display(&transmission.event.id))
        .record(
            "event_type",
            tracing::field::display(&transmission.event.event_type),
        );

    match state.engine.process(&transmission).await {
        Ok(response) => {
            tracing::info!("delivery dispatched");
            Ok(Json(response))
        }
        Err(e) => {
            tracing::warn!(error = %e, "delivery rejected");
            Err(e.into())
        }
    }
}
