use {
    crate::domain::id::OrderId,
    chrono::{DateTime, Duration, Utc},
    std::collections::HashMap,
    std::sync::{Arc, Mutex},
    uuid::Uuid,
};

const TTL_DAYS: i64 = 10;

#[derive(Debug, Clone, Copy)]
struct Record {
    request_id: Uuid,
    expires_at: DateTime<Utc>,
}

type Clock = dyn Fn() -> DateTime<Utc> + Send + Sync;

/// Maps a local order to the provider request-id attached to its mutating
/// calls. The same id is reused until it expires or is invalidated after a
/// confirmed terminal state, so a retried capture/authorize cannot
/// double-charge.
#[derive(Clone)]
pub struct IdempotencyKeys {
    inner: Arc<Mutex<HashMap<OrderId, Record>>>,
    clock: Arc<Clock>,
}

impl Default for IdempotencyKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl IdempotencyKeys {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Injectable clock, for expiry tests.
    pub fn with_clock(clock: Arc<Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    pub fn get_or_create(&self, order_id: OrderId) -> Uuid {
        let now = (self.clock)();
        let mut map = self.inner.lock().expect("idempotency map poisoned");

        // Lazy GC: expired entries are dropped before the new value lands.
        map.retain(|_, record| record.expires_at > now);

        map.entry(order_id)
            .or_insert_with(|| Record {
                request_id: Uuid::now_v7(),
                expires_at: now + Duration::days(TTL_DAYS),
            })
            .request_id
    }

    pub fn invalidate(&self, order_id: OrderId) {
        self.inner
            .lock()
            .expect("idempotency map poisoned")
            .remove(&order_id);
    }
}
