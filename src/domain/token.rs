use serde::{Deserialize, Serialize};

/// Opaque reference to a vaulted payment instrument. Created at vault time,
/// consumed later by renewal/capture flows; its lifecycle past that point
/// belongs to the provider and the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToken {
    pub id: String,
    pub kind: String,
}

impl PaymentToken {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}
