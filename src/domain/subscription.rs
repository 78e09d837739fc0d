use {
    super::id::OrderId,
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring-billing agreement whose parent order paid for the first term.
/// The vaulting-failure policies mutate these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    id: Uuid,
    parent_order: OrderId,
    status: SubscriptionStatus,
    requires_manual_renewal: bool,
}

impl Subscription {
    pub fn new(parent_order: OrderId) -> Self {
        Self {
            id: Uuid::now_v7(),
            parent_order,
            status: SubscriptionStatus::Active,
            requires_manual_renewal: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn parent_order(&self) -> OrderId {
        self.parent_order
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub fn cancel(&mut self) {
        self.status = SubscriptionStatus::Cancelled;
    }

    pub fn requires_manual_renewal(&self) -> bool {
        self.requires_manual_renewal
    }

    /// No vaulted instrument to rebill against; a human has to renew.
    pub fn flag_manual_renewal(&mut self) {
        self.requires_manual_renewal = true;
    }
}
