use {
    super::error::PayError,
    super::id::{OrderId, RemoteOrderId},
    super::order::LocalOrder,
    super::subscription::Subscription,
    super::token::PaymentToken,
};

/// Persistence seam for the local commerce order. The real backend lives
/// outside this core; `infra::memory` provides the in-process one.
pub trait OrderStore: Send + Sync {
    fn get(&self, id: OrderId) -> Option<LocalOrder>;
    fn find_by_remote(&self, remote_id: &RemoteOrderId) -> Option<LocalOrder>;
    fn save(&self, order: &LocalOrder) -> Result<(), PayError>;
}

pub trait SubscriptionStore: Send + Sync {
    fn find_by_parent(&self, order_id: OrderId) -> Vec<Subscription>;
    fn save(&self, subscription: &Subscription) -> Result<(), PayError>;
}

/// Vaulted-instrument lookup, keyed by owner identity (registered customer
/// id or a guest pseudo-identity).
pub trait TokenStore: Send + Sync {
    fn tokens_for(&self, owner: &str) -> Vec<PaymentToken>;
}
