use {
    super::authorized_payments::{AuthorizedPayments, CaptureStatus},
    super::threeds::{self, ThreeDsDecision},
    super::vault_check::VaultCheck,
    crate::domain::{
        error::PayError,
        events::{DomainEvent, EventSink},
        id::OrderId,
        order::{Intent, LocalOrder, LocalOrderStatus},
        provider::PaymentProvider,
        remote::{PurchaseUnit, RemoteOrder, RemoteOrderStatus},
        settings::Settings,
        stores::OrderStore,
    },
    crate::infra::{
        idempotency::IdempotencyKeys,
        memory::CheckoutSession,
        scheduler::Scheduler,
    },
    std::sync::Arc,
};

/// Drives a checkout-completed order through the capture/authorize decision
/// and propagates remote status back to the local order.
///
/// Remote-order bookkeeping is written first, so any later failure leaves
/// the order resumable rather than inconsistent.
pub struct OrderProcessor {
    provider: Arc<dyn PaymentProvider>,
    orders: Arc<dyn OrderStore>,
    idempotency: IdempotencyKeys,
    settings: Settings,
    authorized: Arc<AuthorizedPayments>,
    vault_check: Arc<VaultCheck>,
    session: CheckoutSession,
    scheduler: Arc<dyn Scheduler>,
    events: Arc<dyn EventSink>,
}

impl OrderProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        orders: Arc<dyn OrderStore>,
        idempotency: IdempotencyKeys,
        settings: Settings,
        authorized: Arc<AuthorizedPayments>,
        vault_check: Arc<VaultCheck>,
        session: CheckoutSession,
        scheduler: Arc<dyn Scheduler>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            provider,
            orders,
            idempotency,
            settings,
            authorized,
            vault_check,
            session,
            scheduler,
            events,
        }
    }

    pub async fn process(
        &self,
        order: &mut LocalOrder,
        remote: RemoteOrder,
    ) -> Result<(), PayError> {
        // 1. Bookkeeping before any side effect: a crash mid-flow must be
        //    resumable from the stored remote id + intent alone.
        order.record_remote(remote.id.clone(), remote.intent);
        self.orders.save(order)?;

        // 2–3. Approval gate. A card order answers to the 3-D-Secure
        //      decision; REJECT is terminal for this attempt.
        match threeds::decide(remote.card()) {
            ThreeDsDecision::Reject => return Err(PayError::ThreeDsRejected),
            ThreeDsDecision::Proceed | ThreeDsDecision::NoDecision => {}
        }
        if remote.status != RemoteOrderStatus::Approved && remote.card().is_none() {
            return Err(PayError::NotApproved {
                status: remote.status,
            });
        }

        // 4. Line totals/address may have changed since the remote order was
        //    created; push the latest purchase units before moving money.
        let request_id = self.idempotency.get_or_create(order.id());
        let units = vec![PurchaseUnit::new("default", order.total())];
        let remote = self.provider.patch_order(&remote, units, request_id).await?;

        // 5. Capture or authorize per the recorded intent.
        let intent = remote.intent;
        if intent == Intent::Authorize {
            order.set_captured(false);
            self.orders.save(order)?;
        }
        let settled = match intent {
            Intent::Capture => self.provider.capture(&remote.id, request_id).await?,
            Intent::Authorize => self.provider.authorize(&remote.id, request_id).await?,
        };

        // 6. Status propagation.
        order.set_status(LocalOrderStatus::AwaitingPayment);
        if intent == Intent::Capture && settled.status == RemoteOrderStatus::Completed {
            order.mark_paid();
            self.idempotency.invalidate(order.id());
        }
        self.orders.save(order)?;

        // 7. Eager capture of virtual-only carts. The capture/authorize
        //    response drops item category data, so only a fresh fetch can
        //    answer the physical-goods question.
        if intent == Intent::Authorize && self.settings.capture_for_virtual_only {
            let fresh = self.provider.fetch_order(&remote.id).await?;
            if !fresh.has_physical_goods() {
                match self.authorized.capture(order).await? {
                    CaptureStatus::Successful | CaptureStatus::AlreadyCaptured => {}
                    // Order stays awaiting payment; the deferred check or a
                    // webhook delivery converges it later.
                    CaptureStatus::Failed
                    | CaptureStatus::Inaccessible
                    | CaptureStatus::NotFound => {}
                }
            }
        }

        // 8. Done: drop the session order context and hand the vaulting
        //    verification to the scheduler.
        self.session.clear();
        self.events.publish(DomainEvent::OrderProcessed {
            order_id: order.id(),
            intent,
        });
        self.schedule_vault_check(order.id());
        Ok(())
    }

    fn schedule_vault_check(&self, order_id: OrderId) {
        let vault_check = Arc::clone(&self.vault_check);
        self.scheduler.schedule(
            self.settings.vault_check_delay(),
            Box::pin(async move {
                if let Err(e) = vault_check.run(order_id).await {
                    tracing::error!(order_id = %order_id, error = %e, "saved-payment check failed");
                }
            }),
        );
    }
}
