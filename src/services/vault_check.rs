use {
    super::authorized_payments::AuthorizedPayments,
    crate::domain::{
        error::PayError,
        events::{DomainEvent, EventSink},
        id::OrderId,
        order::{Intent, LocalOrder, LocalOrderStatus},
        provider::PaymentProvider,
        remote::RemoteOrder,
        settings::{Settings, VaultFailurePolicy},
        stores::{OrderStore, SubscriptionStore, TokenStore},
        token::PaymentToken,
    },
    std::sync::Arc,
};

pub const POLICY_META_KEY: &str = "vault_failure_policy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultCheckOutcome {
    /// Order already processing, or intent wasn't capture.
    Skipped,
    /// Free-trial order: hold released, order paid without charging.
    FreeTrialVoided,
    /// A vaulted token exists; the authorization was captured.
    Captured,
    /// Vaulting failed; the configured compensation policy ran.
    PolicyApplied(VaultFailurePolicy),
}

/// Deferred reconciliation: confirms a payment instrument was actually
/// vaulted after checkout, and compensates when it wasn't. Runs once per
/// order, a few minutes after checkout.
pub struct VaultCheck {
    provider: Arc<dyn PaymentProvider>,
    orders: Arc<dyn OrderStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    tokens: Arc<dyn TokenStore>,
    authorized: Arc<AuthorizedPayments>,
    settings: Settings,
    events: Arc<dyn EventSink>,
}

impl VaultCheck {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        orders: Arc<dyn OrderStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        tokens: Arc<dyn TokenStore>,
        authorized: Arc<AuthorizedPayments>,
        settings: Settings,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            provider,
            orders,
            subscriptions,
            tokens,
            authorized,
            settings,
            events,
        }
    }

    pub async fn run(&self, order_id: OrderId) -> Result<VaultCheckOutcome, PayError> {
        let mut order = self.orders.get(order_id).ok_or_else(|| {
            PayError::PreconditionFailed(format!("no local order {order_id}"))
        })?;

        if order.status() == LocalOrderStatus::Processing || order.is_paid() {
            return Ok(VaultCheckOutcome::Skipped);
        }
        if order.intent() != Some(Intent::Capture) {
            return Ok(VaultCheckOutcome::Skipped);
        }

        // Free trial: nothing to collect, but the hold must not linger.
        if order.is_free_trial() && order.payment_method().supports_deferred_capture() {
            let remote = self.fetch_remote(&order).await?;
            self.authorized.void(&order, &remote).await?;
            order.mark_paid();
            self.orders.save(&order)?;
            return Ok(VaultCheckOutcome::FreeTrialVoided);
        }

        if self.resolve_tokens(&order).is_some() {
            self.authorized.capture(&mut order).await?;
            return Ok(VaultCheckOutcome::Captured);
        }

        // No token materialized, so vaulting failed. Exactly one policy runs,
        // and the choice is recorded on the order for downstream messaging.
        let policy = self.settings.vault_failure_policy;
        match policy {
            VaultFailurePolicy::VoidAuth => {
                let remote = self.fetch_remote(&order).await?;
                self.authorized.void(&order, &remote).await?;
                order.set_status(LocalOrderStatus::Failed);
                for mut subscription in self.subscriptions.find_by_parent(order.id()) {
                    subscription.cancel();
                    self.subscriptions.save(&subscription)?;
                }
            }
            VaultFailurePolicy::CaptureAuth => {
                self.authorized.capture(&mut order).await?;
                for mut subscription in self.subscriptions.find_by_parent(order.id()) {
                    subscription.flag_manual_renewal();
                    self.subscriptions.save(&subscription)?;
                }
            }
            VaultFailurePolicy::CaptureAuthIgnore => {
                self.authorized.capture(&mut order).await?;
            }
        }

        order.meta_insert(POLICY_META_KEY, serde_json::json!(policy.as_str()));
        self.orders.save(&order)?;
        self.events.publish(DomainEvent::VaultingFailed {
            order_id: order.id(),
            policy,
        });
        Ok(VaultCheckOutcome::PolicyApplied(policy))
    }

    async fn fetch_remote(&self, order: &LocalOrder) -> Result<RemoteOrder, PayError> {
        let remote_id = order.remote_order_id().ok_or_else(|| {
            PayError::PreconditionFailed(format!(
                "order {} has no remote order recorded",
                order.id()
            ))
        })?;
        self.provider.fetch_order(remote_id).await
    }

    /// Guest identity first, then the pre-migration guest identity, then the
    /// registered customer. First owner with any tokens wins.
    fn resolve_tokens(&self, order: &LocalOrder) -> Option<Vec<PaymentToken>> {
        let mut owners = vec![order.guest_owner(), order.legacy_guest_owner()];
        if let Some(customer_id) = order.customer_id() {
            owners.push(customer_id.to_string());
        }
        owners.iter().find_map(|owner| {
            let tokens = self.tokens.tokens_for(owner);
            (!tokens.is_empty()).then_some(tokens)
        })
    }
}
