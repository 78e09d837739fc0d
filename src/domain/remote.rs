use {
    super::error::PayError,
    super::id::{AuthorizationId, RemoteOrderId},
    super::money::Money,
    super::order::Intent,
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteOrderStatus {
    Created,
    Approved,
    Completed,
    Voided,
}

impl RemoteOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Approved => "APPROVED",
            Self::Completed => "COMPLETED",
            Self::Voided => "VOIDED",
        }
    }
}

impl fmt::Display for RemoteOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for RemoteOrderStatus {
    type Error = PayError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "CREATED" => Ok(Self::Created),
            "APPROVED" => Ok(Self::Approved),
            "COMPLETED" => Ok(Self::Completed),
            "VOIDED" => Ok(Self::Voided),
            other => Err(PayError::PreconditionFailed(format!(
                "unknown remote order status: {other}"
            ))),
        }
    }
}

/// Shared lifecycle for authorizations and captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorizationStatus {
    Created,
    Pending,
    Completed,
    Voided,
    Denied,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Voided => "VOIDED",
            Self::Denied => "DENIED",
        }
    }

    /// Only a freshly created hold can be captured or voided. A pending
    /// authorization is still under provider review; everything else is
    /// already resolved.
    pub fn is_capturable(&self) -> bool {
        matches!(self, Self::Created)
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for AuthorizationStatus {
    type Error = PayError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "CREATED" => Ok(Self::Created),
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "VOIDED" => Ok(Self::Voided),
            "DENIED" => Ok(Self::Denied),
            other => Err(PayError::PreconditionFailed(format!(
                "unknown authorization status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authorization {
    pub id: AuthorizationId,
    pub status: AuthorizationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: AuthorizationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    PhysicalGoods,
    DigitalGoods,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub category: ItemCategory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseUnitPayments {
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseUnit {
    pub reference_id: String,
    pub amount: Money,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub payments: Option<PurchaseUnitPayments>,
}

impl PurchaseUnit {
    pub fn new(reference_id: impl Into<String>, amount: Money) -> Self {
        Self {
            reference_id: reference_id.into(),
            amount,
            items: Vec::new(),
            payments: None,
        }
    }
}

/// How much fraud liability shifted to the issuer after 3-D-Secure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiabilityShift {
    Possible,
    No,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardAuthenticationResult {
    pub liability_shift: Option<LiabilityShift>,
    /// Raw issuer authentication status (`Y`, `N`, `R`, `A`, `U`, `C`).
    pub authentication_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardDetails {
    pub last_digits: Option<String>,
    pub authentication_result: Option<CardAuthenticationResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSource {
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: RemoteOrderId,
    pub intent: Intent,
    pub status: RemoteOrderStatus,
    pub purchase_units: Vec<PurchaseUnit>,
    pub payment_source: Option<PaymentSource>,
}

impl RemoteOrder {
    pub fn card(&self) -> Option<&CardDetails> {
        self.payment_source.as_ref()?.card.as_ref()
    }

    /// All authorizations across all purchase units.
    pub fn authorizations(&self) -> impl Iterator<Item = &Authorization> {
        self.purchase_units
            .iter()
            .filter_map(|pu| pu.payments.as_ref())
            .flat_map(|p| p.authorizations.iter())
    }

    pub fn capturable_authorizations(&self) -> Vec<&Authorization> {
        self.authorizations()
            .filter(|a| a.status.is_capturable())
            .collect()
    }

    /// Category data survives only on a freshly fetched order; the
    /// capture/authorize responses drop it, so callers must re-fetch
    /// before trusting this.
    pub fn has_physical_goods(&self) -> bool {
        self.purchase_units
            .iter()
            .flat_map(|pu| pu.items.iter())
            .any(|item| item.category == ItemCategory::PhysicalGoods)
    }
}
