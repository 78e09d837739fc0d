use {
    super::error::PayError,
    super::id::{OrderId, RemoteOrderId},
    super::money::Money,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
    std::fmt,
};

/// Whether funds are collected immediately or reserved for a later capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Capture,
    Authorize,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capture => "CAPTURE",
            Self::Authorize => "AUTHORIZE",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Intent {
    type Error = PayError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "CAPTURE" | "capture" => Ok(Self::Capture),
            "AUTHORIZE" | "authorize" => Ok(Self::Authorize),
            other => Err(PayError::PreconditionFailed(format!(
                "unknown intent: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Live,
    Sandbox,
}

impl TryFrom<&str> for PaymentMode {
    type Error = PayError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "live" => Ok(Self::Live),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(PayError::PreconditionFailed(format!(
                "unknown payment mode: {other}"
            ))),
        }
    }
}

/// Payment method the buyer checked out with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    PayPalWallet,
    Other,
}

impl PaymentMethod {
    /// Card and wallet payments leave a voidable authorization behind, which
    /// is what the free-trial rule needs.
    pub fn supports_deferred_capture(&self) -> bool {
        matches!(self, Self::Card | Self::PayPalWallet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalOrderStatus {
    Pending,
    AwaitingPayment,
    Processing,
    Failed,
    Cancelled,
}

impl LocalOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Processing => "processing",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LocalOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The local side of an order pair. Remote-order bookkeeping
/// (`remote_order_id`, `intent`) is written before any capture/authorize
/// call so a retry can resume without re-fetching context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalOrder {
    id: OrderId,
    customer_id: Option<String>,
    status: LocalOrderStatus,
    paid: bool,
    total: Money,
    payment_method: PaymentMethod,
    payment_mode: PaymentMode,
    remote_order_id: Option<RemoteOrderId>,
    intent: Option<Intent>,
    captured: bool,
    meta: BTreeMap<String, serde_json::Value>,
}

impl LocalOrder {
    pub fn new(
        id: OrderId,
        customer_id: Option<String>,
        total: Money,
        payment_method: PaymentMethod,
        payment_mode: PaymentMode,
    ) -> Self {
        Self {
            id,
            customer_id,
            status: LocalOrderStatus::Pending,
            paid: false,
            total,
            payment_method,
            payment_mode,
            remote_order_id: None,
            intent: None,
            captured: false,
            meta: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn status(&self) -> LocalOrderStatus {
        self.status
    }

    pub fn set_status(&mut self, status: LocalOrderStatus) {
        self.status = status;
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    /// Payment received: flips to processing and marks the order paid.
    pub fn mark_paid(&mut self) {
        self.paid = true;
        self.status = LocalOrderStatus::Processing;
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn payment_mode(&self) -> PaymentMode {
        self.payment_mode
    }

    pub fn remote_order_id(&self) -> Option<&RemoteOrderId> {
        self.remote_order_id.as_ref()
    }

    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    /// Step-one bookkeeping: must happen before any remote side effect.
    pub fn record_remote(&mut self, remote_order_id: RemoteOrderId, intent: Intent) {
        self.remote_order_id = Some(remote_order_id);
        self.intent = Some(intent);
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
    }

    pub fn is_free_trial(&self) -> bool {
        self.total.is_zero()
    }

    pub fn meta_get(&self, key: &str) -> Option<&serde_json::Value> {
        self.meta.get(key)
    }

    pub fn meta_insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.meta.insert(key.into(), value);
    }

    /// Vault owner identity for guest checkouts.
    pub fn guest_owner(&self) -> String {
        format!("guest:{}", self.id)
    }

    /// Identity format used before the guest-id scheme changed; still
    /// consulted so older vault entries resolve.
    pub fn legacy_guest_owner(&self) -> String {
        format!("guest_legacy:{}", self.id)
    }
}
