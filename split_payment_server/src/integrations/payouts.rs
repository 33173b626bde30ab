use payout_tools::{PayoutApi, PayoutRequest};
use split_payment_engine::traits::{PayoutInstruction, PayoutProvider, PayoutProviderError, PayoutReceipt};

/// Adapts the payout provider's REST client to the engine's [`PayoutProvider`] seam.
#[derive(Clone)]
pub struct PayoutGateway {
    api: PayoutApi,
}

impl PayoutGateway {
    pub fn new(api: PayoutApi) -> Self {
        Self { api }
    }
}

impl PayoutProvider for PayoutGateway {
    async fn send_payout(&self, instruction: PayoutInstruction) -> Result<PayoutReceipt, PayoutProviderError> {
        let request = PayoutRequest::neft(
            instruction.reference_id,
            instruction.beneficiary_name,
            instruction.account_number,
            instruction.ifsc_code,
            instruction.amount,
        );
        let response = self.api.create_payout(request).await.map_err(|e| PayoutProviderError(e.to_string()))?;
        Ok(PayoutReceipt { provider_ref: response.id, status: response.status, utr: response.utr })
    }
}
