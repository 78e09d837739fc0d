use {
    super::error::PayError,
    super::order::Intent,
    std::fmt,
    std::time::Duration,
};

/// What to do when a checkout finishes but no vaulted token materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VaultFailurePolicy {
    /// Release the hold, fail the order, cancel linked subscriptions.
    #[default]
    VoidAuth,
    /// Collect the money anyway; linked subscriptions need manual renewal.
    CaptureAuth,
    /// Collect the money anyway; leave subscriptions alone.
    CaptureAuthIgnore,
}

impl VaultFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoidAuth => "void_auth",
            Self::CaptureAuth => "capture_auth",
            Self::CaptureAuthIgnore => "capture_auth_ignore",
        }
    }
}

impl fmt::Display for VaultFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for VaultFailurePolicy {
    type Error = PayError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "void_auth" => Ok(Self::VoidAuth),
            "capture_auth" => Ok(Self::CaptureAuth),
            "capture_auth_ignore" => Ok(Self::CaptureAuthIgnore),
            other => Err(PayError::PreconditionFailed(format!(
                "unknown vault failure policy: {other}"
            ))),
        }
    }
}

/// Merchant configuration, constructed once per request/job and passed in.
/// No ambient lookups anywhere in the core.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub intent: Intent,
    pub capture_for_virtual_only: bool,
    pub vault_failure_policy: VaultFailurePolicy,
}

impl Settings {
    pub fn new(
        intent: Intent,
        capture_for_virtual_only: bool,
        vault_failure_policy: VaultFailurePolicy,
    ) -> Self {
        Self {
            intent,
            capture_for_virtual_only,
            vault_failure_policy,
        }
    }

    /// Delay before the saved-payment verification runs. `CaptureAuth`
    /// wants the order paid as fast as possible, so it runs immediately.
    pub fn vault_check_delay(&self) -> Duration {
        match self.vault_failure_policy {
            VaultFailurePolicy::CaptureAuth => Duration::ZERO,
            _ => Duration::from_secs(180),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Intent::Capture, false, VaultFailurePolicy::default())
    }
}
