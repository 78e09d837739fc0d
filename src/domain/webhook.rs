use {
    super::error::PayError,
    super::id::{EventId, SubscriptionId},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// One provider notification. The event `id` is the idempotency key;
/// handlers must tolerate at-least-once delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: EventId,
    pub event_type: String,
    pub resource_type: String,
    pub resource: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Parse an inbound delivery body. Requires at least
    /// `{id, event_type, resource_type, resource}`.
    pub fn from_body(body: &str, received_at: DateTime<Utc>) -> Result<Self, PayError> {
        let raw: serde_json::Value = serde_json::from_str(body)?;
        let field = |name: &str| -> Result<String, PayError> {
            raw.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    PayError::VerificationFailed(format!("delivery body missing `{name}`"))
                })
        };
        Ok(Self {
            id: EventId::new(field("id")?)
                .map_err(|e| PayError::VerificationFailed(e.to_string()))?,
            event_type: field("event_type")?,
            resource_type: field("resource_type")?,
            resource: raw.get("resource").cloned().unwrap_or(serde_json::Value::Null),
            received_at,
        })
    }
}

/// Signature headers plus the raw body of one delivery, everything the
/// provider's verification endpoint wants back.
#[derive(Debug, Clone)]
pub struct WebhookTransmission {
    pub transmission_id: String,
    pub transmission_time: String,
    pub transmission_sig: String,
    pub cert_url: String,
    pub auth_algo: String,
    pub body: String,
    pub event: WebhookEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: SubscriptionId,
    pub url: String,
    pub event_types: Vec<String>,
}

/// Most recent verified event, kept for diagnostics only. Not a
/// cross-restart dedup mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastEvent {
    pub id: EventId,
    pub received_at: DateTime<Utc>,
}
