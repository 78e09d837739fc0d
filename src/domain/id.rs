use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PayError;

/// Local commerce order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// Provider-side order identifier (opaque, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteOrderId(String);

impl RemoteOrderId {
    pub fn new(id: impl Into<String>) -> Result<Self, PayError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PayError::PreconditionFailed(
                "remote order id must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authorization identifier within a purchase unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationId(String);

impl AuthorizationId {
    pub fn new(id: impl Into<String>) -> Result<Self, PayError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PayError::PreconditionFailed(
                "authorization id must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Provider webhook event identifier (`WH-xxx`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Result<Self, PayError> {
        let id = id.into();
        if !id.starts_with("WH-") {
            return Err(PayError::PreconditionFailed(format!(
                "event id must start with WH-, got: {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Webhook subscription identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Result<Self, PayError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PayError::PreconditionFailed(
                "subscription id must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
