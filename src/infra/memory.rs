use {
    crate::domain::{
        error::PayError,
        id::{OrderId, RemoteOrderId},
        order::LocalOrder,
        stores::{OrderStore, SubscriptionStore, TokenStore},
        subscription::Subscription,
        token::PaymentToken,
    },
    std::collections::HashMap,
    std::sync::{Arc, Mutex},
    uuid::Uuid,
};

/// In-process order store. Production deployments plug the commerce
/// platform's own store in behind the same trait.
#[derive(Clone, Default)]
pub struct InMemoryOrders {
    inner: Arc<Mutex<HashMap<OrderId, LocalOrder>>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrders {
    fn get(&self, id: OrderId) -> Option<LocalOrder> {
        self.inner.lock().expect("order map poisoned").get(&id).cloned()
    }

    fn find_by_remote(&self, remote_id: &RemoteOrderId) -> Option<LocalOrder> {
        self.inner
            .lock()
            .expect("order map poisoned")
            .values()
            .find(|order| order.remote_order_id() == Some(remote_id))
            .cloned()
    }

    fn save(&self, order: &LocalOrder) -> Result<(), PayError> {
        self.inner
            .lock()
            .expect("order map poisoned")
            .insert(order.id(), order.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemorySubscriptions {
    inner: Arc<Mutex<HashMap<Uuid, Subscription>>>,
}

impl InMemorySubscriptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriptionStore for InMemorySubscriptions {
    fn find_by_parent(&self, order_id: OrderId) -> Vec<Subscription> {
        self.inner
            .lock()
            .expect("subscription map poisoned")
            .values()
            .filter(|sub| sub.parent_order() == order_id)
            .cloned()
            .collect()
    }

    fn save(&self, subscription: &Subscription) -> Result<(), PayError> {
        self.inner
            .lock()
            .expect("subscription map poisoned")
            .insert(subscription.id(), subscription.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTokens {
    inner: Arc<Mutex<HashMap<String, Vec<PaymentToken>>>>,
}

impl InMemoryTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, owner: impl Into<String>, token: PaymentToken) {
        self.inner
            .lock()
            .expect("token map poisoned")
            .entry(owner.into())
            .or_default()
            .push(token);
    }
}

impl TokenStore for InMemoryTokens {
    fn tokens_for(&self, owner: &str) -> Vec<PaymentToken> {
        self.inner
            .lock()
            .expect("token map poisoned")
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }
}

/// Checkout-session order context: which remote order the current checkout
/// is paying for. Cleared once processing succeeds.
#[derive(Clone, Default)]
pub struct CheckoutSession {
    inner: Arc<Mutex<Option<RemoteOrderId>>>,
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, remote_order_id: RemoteOrderId) {
        *self.inner.lock().expect("session poisoned") = Some(remote_order_id);
    }

    pub fn current(&self) -> Option<RemoteOrderId> {
        self.inner.lock().expect("session poisoned").clone()
    }

    pub fn clear(&self) {
        *self.inner.lock().expect("session poisoned") = None;
    }
}
