use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{CoPayment, Contributor, MaterializeOutcome, NewOrder, Order, OrderNumber, PaymentStatus, SinglePaymentOutcome},
    helpers::generate_order_number,
    order_intent::OrderIntent,
    traits::{SettlementDatabase, SettlementError},
};

pub const CO_PAYMENT_METHOD: &str = "co_payment";
pub const PAYMENT_LINK_METHOD: &str = "payment_link";

/// `SettlementFlowApi` is the primary API for handling payment-link webhook events: contributor
/// confirmation, co-payment completion, and order materialization.
///
/// It is the only writer of co-payment and order state. All of its operations are idempotent with
/// respect to webhook redelivery, keyed on the gateway's payment-link identifier.
pub struct SettlementFlowApi<B> {
    db: B,
}

impl<B> Debug for SettlementFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementFlowApi")
    }
}

impl<B> SettlementFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

/// What a "payment link paid" event resulted in.
#[derive(Debug, Clone)]
pub enum PaidOutcome {
    /// The link belonged to a contributor. `order` is set once the co-payment is complete, whether
    /// this event materialized it or an earlier delivery did.
    ContributorConfirmed {
        co_payment: CoPayment,
        order: Option<Order>,
        /// True only for the event that actually created the order. Settlement and notification
        /// fire exactly once, for that event.
        newly_materialized: bool,
        /// True if this was a redelivery of an already-applied confirmation.
        replayed: bool,
    },
    /// The link's order note pointed at a single-payment order that is now (or already was) paid.
    SingleOrderPaid { order: Order, replayed: bool },
    /// The link is unknown and the event carried no order note. Acknowledged, dropped.
    Unroutable { link_id: String },
}

/// What a "payment link cancelled" event resulted in.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    ContributorCancelled(Contributor),
    SingleOrderCancelled(Order),
    /// The order was already paid when the cancellation arrived. Nothing changed.
    SingleOrderAlreadyPaid(Order),
    Unroutable { link_id: String },
}

impl<B> SettlementFlowApi<B>
where B: SettlementDatabase
{
    /// Processes a confirmed "payment link paid" event.
    ///
    /// The link id routes the event: a known contributor link takes the split-payment path, an
    /// order note takes the single-payment path, anything else is acknowledged and dropped.
    ///
    /// On the split path, the contributor is marked paid (idempotently) and, if that makes every
    /// contributor paid, the order is materialized exactly once. A co-payment whose `order_id` is
    /// already set short-circuits to the existing order; that claim is the duplicate-order gate.
    ///
    /// Storage errors propagate so the webhook endpoint answers with a retryable status. A
    /// [`SettlementError::DataIntegrity`] error means the contributors have genuinely paid but the
    /// order intent cannot produce an order; the co-payment is deliberately left completed without
    /// an order for manual reconciliation.
    pub async fn process_link_paid(
        &self,
        link_id: &str,
        payment_id: Option<&str>,
        order_note: Option<&str>,
    ) -> Result<PaidOutcome, SettlementError> {
        if self.db.fetch_contributor_by_link(link_id).await?.is_some() {
            return self.confirm_contributor_payment(link_id).await;
        }
        match order_note {
            Some(number) => self.confirm_single_payment(&OrderNumber(number.to_string()), payment_id).await,
            None => {
                info!("🔀️ Paid event for unknown link [{link_id}] with no order note. Acknowledged and dropped.");
                Ok(PaidOutcome::Unroutable { link_id: link_id.to_string() })
            },
        }
    }

    /// Processes a "payment link cancelled/expired" event. Terminal for the link: no order will
    /// ever be created from it, even if a stale paid event replays afterwards.
    pub async fn process_link_cancelled(
        &self,
        link_id: &str,
        order_note: Option<&str>,
    ) -> Result<CancelOutcome, SettlementError> {
        if let Some(contributor) = self.db.cancel_payment_link(link_id).await? {
            warn!(
                "🔀️❌️ Payment link [{link_id}] of contributor {} (co-payment #{}) was cancelled by the gateway.",
                contributor.email, contributor.co_payment_id
            );
            return Ok(CancelOutcome::ContributorCancelled(contributor));
        }
        match order_note {
            Some(number) => {
                let order = self.db.cancel_single_order(&OrderNumber(number.to_string())).await?;
                if order.payment_status == PaymentStatus::Completed {
                    debug!(
                        "🔀️ Cancelled event for link [{link_id}] arrived after order {} was paid. Nothing to mark.",
                        order.order_number
                    );
                    return Ok(CancelOutcome::SingleOrderAlreadyPaid(order));
                }
                warn!("🔀️❌️ Payment link [{link_id}] for order {} was cancelled.", order.order_number);
                Ok(CancelOutcome::SingleOrderCancelled(order))
            },
            None => {
                debug!("🔀️ Cancelled event for unknown link [{link_id}]. Nothing to mark.");
                Ok(CancelOutcome::Unroutable { link_id: link_id.to_string() })
            },
        }
    }

    async fn confirm_contributor_payment(&self, link_id: &str) -> Result<PaidOutcome, SettlementError> {
        let outcome = self.db.confirm_contributor(link_id).await?;
        let replayed = !outcome.freshly_paid;
        if replayed {
            debug!(
                "🔀️💰️ Replayed confirmation for link [{link_id}] (contributor {}). No state change.",
                outcome.contributor.email
            );
        } else {
            info!(
                "🔀️💰️ Contributor {} paid {} towards co-payment #{}.",
                outcome.contributor.email, outcome.contributor.amount_owed, outcome.co_payment.id
            );
        }
        if !outcome.all_paid {
            return Ok(PaidOutcome::ContributorConfirmed {
                co_payment: outcome.co_payment,
                order: None,
                newly_materialized: false,
                replayed,
            });
        }
        // Every share is in. Short-circuit if a previous delivery already materialized the order.
        let co_payment = outcome.co_payment;
        if let Some(order_id) = co_payment.order_id {
            let order = self
                .db
                .fetch_order_by_id(order_id)
                .await?
                .ok_or_else(|| SettlementError::OrderNotFound(format!("internal id {order_id}")))?;
            debug!("🔀️📦️ Co-payment #{} already materialized order {}.", co_payment.id, order.order_number);
            return Ok(PaidOutcome::ContributorConfirmed {
                co_payment,
                order: Some(order),
                newly_materialized: false,
                replayed,
            });
        }
        let (order, newly_materialized) = self.materialize_from_co_payment(&co_payment).await?;
        Ok(PaidOutcome::ContributorConfirmed { co_payment, order: Some(order), newly_materialized, replayed })
    }

    /// Converts a completed co-payment into a persisted order.
    ///
    /// Returns the order and whether this call created it. The backend's atomic claim on
    /// `order_id` resolves races between concurrent final confirmations: exactly one caller
    /// observes `true`.
    async fn materialize_from_co_payment(&self, co_payment: &CoPayment) -> Result<(Order, bool), SettlementError> {
        if co_payment.order_id.is_some() {
            return Err(SettlementError::PreconditionViolation(format!(
                "materialize called for co-payment #{} which already has an order",
                co_payment.id
            )));
        }
        let intent = OrderIntent::from_json(&co_payment.order_intent).map_err(|e| {
            error!(
                "🔀️🚨️ Co-payment #{} is fully paid but its order intent is unusable. It is left completed WITHOUT \
                 an order and needs manual reconciliation. {e}",
                co_payment.id
            );
            e
        })?;
        let vendor_id = intent.resolve_vendor().map_err(|e| {
            error!(
                "🔀️🚨️ Co-payment #{} is fully paid but no vendor can be resolved from its intent. It is left \
                 completed WITHOUT an order and needs manual reconciliation. {e}",
                co_payment.id
            );
            e
        })?;
        let order = NewOrder {
            order_number: generate_order_number(),
            customer: intent.customer.clone(),
            vendor_id,
            total_amount: co_payment.total_amount,
            // The gateway has already collected every share; this path never creates a pending order.
            payment_status: PaymentStatus::Completed,
            payment_method: CO_PAYMENT_METHOD.to_string(),
            gateway_payment_id: None,
            delivery_address: intent.delivery_address.clone(),
            line_items: intent.line_items_json(),
            estimated_delivery: intent.delivery_estimate(Utc::now()),
        };
        match self.db.materialize_order(co_payment.id, order).await? {
            MaterializeOutcome::Created(order) => {
                info!("🔀️📦️ Co-payment #{} materialized order {}.", co_payment.id, order.order_number);
                Ok((order, true))
            },
            MaterializeOutcome::AlreadyMaterialized(order) => {
                debug!(
                    "🔀️📦️ Lost the materialization race for co-payment #{}; order {} already exists.",
                    co_payment.id, order.order_number
                );
                Ok((order, false))
            },
        }
    }

    async fn confirm_single_payment(
        &self,
        number: &OrderNumber,
        payment_id: Option<&str>,
    ) -> Result<PaidOutcome, SettlementError> {
        let payment_id = payment_id.unwrap_or_default();
        match self.db.confirm_single_order_payment(number, payment_id).await? {
            SinglePaymentOutcome::Confirmed(order) => {
                info!("🔀️💰️ Order {} paid in full via payment link.", order.order_number);
                Ok(PaidOutcome::SingleOrderPaid { order, replayed: false })
            },
            SinglePaymentOutcome::AlreadyCompleted(order) => {
                debug!("🔀️💰️ Replayed paid event for order {}. No state change.", order.order_number);
                Ok(PaidOutcome::SingleOrderPaid { order, replayed: true })
            },
            SinglePaymentOutcome::Cancelled(order) => {
                warn!(
                    "🔀️❌️ Stale paid event for order {} arrived after its link was cancelled. Ignoring.",
                    order.order_number
                );
                Err(SettlementError::LinkCancelled(format!("order {}", order.order_number)))
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
