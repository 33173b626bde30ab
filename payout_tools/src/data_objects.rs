use serde::{Deserialize, Serialize};
use spg_common::Money;

pub const PAYOUT_MODE_NEFT: &str = "NEFT";

/// A payout instruction as the provider's REST API expects it. `reference_id` doubles as the
/// idempotency key on the provider side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub reference_id: String,
    pub beneficiary_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub amount: Money,
    pub currency: String,
    pub mode: String,
}

impl PayoutRequest {
    pub fn neft(
        reference_id: String,
        beneficiary_name: String,
        account_number: String,
        ifsc_code: String,
        amount: Money,
    ) -> Self {
        Self {
            reference_id,
            beneficiary_name,
            account_number,
            ifsc_code,
            amount,
            currency: "INR".to_string(),
            mode: PAYOUT_MODE_NEFT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub id: String,
    pub reference_id: String,
    pub status: String,
    /// The bank's UTR number, present once the transfer has been picked up by the rails.
    pub utr: Option<String>,
    pub amount: Money,
}
