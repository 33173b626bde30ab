use std::fmt::Debug;

use log::*;
use spg_common::Money;

use crate::{
    db_types::{NewPaymentSplit, Order, PaymentSplit, PayoutProfile, SplitStatus},
    helpers::payout_reference,
    traits::{PayoutInstruction, PayoutProvider, SettlementDatabase, SettlementError},
};

pub const DEFAULT_PLATFORM_PERCENT: u8 = 20;
pub const DEFAULT_VENDOR_PERCENT: u8 = 80;

/// The percentage split and the platform's own payout destination.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub platform_percent: u8,
    pub vendor_percent: u8,
    pub platform_profile: PayoutProfile,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            platform_percent: DEFAULT_PLATFORM_PERCENT,
            vendor_percent: DEFAULT_VENDOR_PERCENT,
            platform_profile: PayoutProfile::default(),
        }
    }
}

/// How one settlement leg went. The status string is persisted verbatim on the split row for
/// later reconciliation.
#[derive(Debug, Clone)]
pub struct LegOutcome {
    pub reference: Option<String>,
    pub status: String,
    pub dispatched: bool,
}

impl LegOutcome {
    fn skipped(reason: &str) -> Self {
        Self { reference: None, status: format!("skipped: {reason}"), dispatched: false }
    }

    fn failed(reason: String) -> Self {
        Self { reference: None, status: format!("failed: {reason}"), dispatched: false }
    }
}

/// `SettlementApi` computes the platform/vendor split for a materialized order and hands each leg
/// to the payout provider.
///
/// The whole API is best-effort relative to order creation: callers run it through
/// [`crate::helpers::best_effort`] so a payout or ledger failure can never fail the webhook
/// response once the order exists.
pub struct SettlementApi<B, P> {
    db: B,
    provider: P,
    config: SplitConfig,
}

impl<B, P> Debug for SettlementApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({}/{})", self.config.platform_percent, self.config.vendor_percent)
    }
}

impl<B, P> SettlementApi<B, P> {
    pub fn new(db: B, provider: P, config: SplitConfig) -> Self {
        Self { db, provider, config }
    }
}

impl<B, P> SettlementApi<B, P>
where
    B: SettlementDatabase,
    P: PayoutProvider,
{
    /// Settles a paid order: computes both leg amounts, attempts both payouts independently, and
    /// persists one ledger row.
    ///
    /// The two amounts are each rounded from the total independently — their sum may drift from
    /// the total by a few minor units, which is accepted and recorded as-is. A leg with an
    /// incomplete bank profile is skipped; a provider failure on one leg never blocks the other.
    /// Calling `settle` again for an already-settled order returns the existing ledger row.
    pub async fn settle(&self, order: &Order) -> Result<PaymentSplit, SettlementError> {
        if let Some(existing) = self.db.fetch_payment_split(order.id).await? {
            debug!("💸️ Order {} is already settled. Returning the existing split.", order.order_number);
            return Ok(existing);
        }
        let platform_amount = order.total_amount.percent(self.config.platform_percent);
        let vendor_amount = order.total_amount.percent(self.config.vendor_percent);
        trace!(
            "💸️ Splitting {} for order {}: platform {platform_amount}, vendor {vendor_amount}.",
            order.total_amount,
            order.order_number
        );
        let vendor_profile = self.db.fetch_payout_profile(order.vendor_id).await?;
        let platform = self.attempt_leg("platform", platform_amount, Some(&self.config.platform_profile), order).await;
        let vendor = self.attempt_leg("vendor", vendor_amount, vendor_profile.as_ref(), order).await;
        let status = if platform.dispatched || vendor.dispatched { SplitStatus::Processing } else { SplitStatus::Failed };
        let (split, inserted) = self
            .db
            .insert_payment_split(NewPaymentSplit {
                order_id: order.id,
                total_amount: order.total_amount,
                platform_amount,
                vendor_amount,
                platform_payout_ref: platform.reference,
                vendor_payout_ref: vendor.reference,
                status,
                platform_leg_status: platform.status,
                vendor_leg_status: vendor.status,
            })
            .await?;
        if inserted {
            info!(
                "💸️ Order {} settled with status {}. Platform leg: {}. Vendor leg: {}.",
                order.order_number, split.status, split.platform_leg_status, split.vendor_leg_status
            );
        } else {
            debug!("💸️ A concurrent settlement already recorded a split for order {}.", order.order_number);
        }
        Ok(split)
    }

    async fn attempt_leg(
        &self,
        leg: &str,
        amount: Money,
        profile: Option<&PayoutProfile>,
        order: &Order,
    ) -> LegOutcome {
        let profile = match profile {
            Some(p) if p.is_complete() => p,
            Some(_) => {
                warn!("💸️ The {leg} payout profile for order {} is incomplete. Leg skipped.", order.order_number);
                return LegOutcome::skipped("incomplete payout profile");
            },
            None => {
                warn!("💸️ No {leg} payout profile is configured for order {}. Leg skipped.", order.order_number);
                return LegOutcome::skipped("no payout profile");
            },
        };
        let instruction = PayoutInstruction {
            reference_id: payout_reference(leg, &order.order_number),
            beneficiary_name: profile.beneficiary_name.clone(),
            account_number: profile.account_number.clone(),
            ifsc_code: profile.ifsc_code.clone(),
            amount,
        };
        match self.provider.send_payout(instruction).await {
            Ok(receipt) => {
                debug!("💸️ {leg} leg of {amount} dispatched for order {}. Provider ref {}.", order.order_number, receipt.provider_ref);
                LegOutcome { reference: Some(receipt.provider_ref), status: receipt.status, dispatched: true }
            },
            Err(e) => {
                // Isolated by design of the flow: the other leg still gets its attempt.
                warn!("💸️ {leg} leg failed for order {}. {e}", order.order_number);
                LegOutcome::failed(e.to_string())
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
