use spg_common::Money;
use thiserror::Error;

/// The outbound payout seam. The production implementation wraps the gateway's payout API; tests
/// substitute doubles. One call disburses one settlement leg.
#[allow(async_fn_in_trait)]
pub trait PayoutProvider {
    async fn send_payout(&self, instruction: PayoutInstruction) -> Result<PayoutReceipt, PayoutProviderError>;
}

/// One leg of a settlement, addressed to a fully-configured bank profile.
///
/// `reference_id` is generated by the caller from the leg name, order number and timestamp, and
/// doubles as the provider-side idempotency key.
#[derive(Debug, Clone)]
pub struct PayoutInstruction {
    pub reference_id: String,
    pub beneficiary_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub amount: Money,
}

/// What the provider returned for a leg. The simulated provider produces the same shape, so
/// persistence code does not care which mode is active.
#[derive(Debug, Clone)]
pub struct PayoutReceipt {
    pub provider_ref: String,
    pub status: String,
    pub utr: Option<String>,
}

#[derive(Debug, Clone, Error)]
#[error("Payout provider error: {0}")]
pub struct PayoutProviderError(pub String);
