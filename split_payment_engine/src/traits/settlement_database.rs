use thiserror::Error;

use crate::db_types::{
    CoPayment,
    ConfirmationOutcome,
    Contributor,
    MaterializeOutcome,
    NewCoPayment,
    NewOrder,
    NewPaymentSplit,
    Order,
    OrderNumber,
    PaymentSplit,
    PayoutProfile,
    SinglePaymentOutcome,
};

/// This trait defines the storage behaviour required by the settlement engine.
///
/// All mutation of co-payments, orders and splits goes through this trait; no component writes to
/// the store directly. The two idempotency-critical operations are [`confirm_contributor`], which
/// must apply the confirmation and compute completeness in one transaction, and
/// [`materialize_order`], which must treat "set `order_id` if currently NULL" as an atomic claim.
///
/// [`confirm_contributor`]: SettlementDatabase::confirm_contributor
/// [`materialize_order`]: SettlementDatabase::materialize_order
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Creates a co-payment together with its contributors in one transaction. Called by the
    /// checkout flow (out of scope here) and by test fixtures.
    async fn insert_co_payment(&self, co_payment: NewCoPayment) -> Result<CoPayment, SettlementError>;

    async fn fetch_co_payment(&self, id: i64) -> Result<Option<CoPayment>, SettlementError>;

    /// Looks up the contributor holding the given gateway payment link, if any. This is the branch
    /// point between the split-payment and single-payment webhook paths.
    async fn fetch_contributor_by_link(&self, link_id: &str) -> Result<Option<Contributor>, SettlementError>;

    /// Marks the contributor holding `link_id` as paid and returns the co-payment state as it
    /// stands *after* this confirmation, computed in the same transaction.
    ///
    /// Re-confirming an already-paid contributor is a no-op reported via
    /// [`ConfirmationOutcome::freshly_paid`], never an error: gateways redeliver webhooks.
    /// Confirming a cancelled link fails with [`SettlementError::LinkCancelled`].
    async fn confirm_contributor(&self, link_id: &str) -> Result<ConfirmationOutcome, SettlementError>;

    /// Records that the gateway cancelled or expired the payment link. Terminal for the link: a
    /// later "paid" replay must not be applied. Returns the affected contributor, if the link is
    /// known.
    async fn cancel_payment_link(&self, link_id: &str) -> Result<Option<Contributor>, SettlementError>;

    /// Creates the order for a completed co-payment exactly once.
    ///
    /// In a single transaction: resolves or creates the paying user by email, inserts the order
    /// with `payment_status = Completed`, and links the co-payment's `order_id` with an
    /// `... WHERE order_id IS NULL` update. If the claim affects no rows a concurrent
    /// materialization won, the transaction is rolled back, and the winner's order is returned as
    /// [`MaterializeOutcome::AlreadyMaterialized`].
    async fn materialize_order(&self, co_payment_id: i64, order: NewOrder) -> Result<MaterializeOutcome, SettlementError>;

    /// Inserts an order directly. Used by the single-payment checkout path (out of scope) and by
    /// test fixtures; the co-payment path must use [`materialize_order`] instead.
    ///
    /// [`materialize_order`]: SettlementDatabase::materialize_order
    async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, SettlementError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, SettlementError>;

    /// Marks a single-payment order as paid. Idempotent: a redelivery returns
    /// [`SinglePaymentOutcome::AlreadyCompleted`]. A cancelled order is never revived.
    async fn confirm_single_order_payment(
        &self,
        number: &OrderNumber,
        gateway_payment_id: &str,
    ) -> Result<SinglePaymentOutcome, SettlementError>;

    /// Marks a single-payment order as cancelled because its payment link was removed. A no-op if
    /// the order has already been paid.
    async fn cancel_single_order(&self, number: &OrderNumber) -> Result<Order, SettlementError>;

    async fn fetch_payout_profile(&self, vendor_id: i64) -> Result<Option<PayoutProfile>, SettlementError>;

    /// Stores payout bank details for a vendor. Used by the onboarding flow (out of scope) and by
    /// test fixtures.
    async fn upsert_payout_profile(&self, vendor_id: i64, profile: &PayoutProfile) -> Result<(), SettlementError>;

    /// Persists the settlement ledger entry for an order. Idempotent best-effort: if a split
    /// already exists for the order, the existing row is returned with `false`.
    async fn insert_payment_split(&self, split: NewPaymentSplit) -> Result<(PaymentSplit, bool), SettlementError>;

    async fn fetch_payment_split(&self, order_id: i64) -> Result<Option<PaymentSplit>, SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    /// A storage failure. Retryable: the webhook response must be a 5xx so the gateway redelivers.
    #[error("There is an internal database error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("No contributor holds payment link {0}")]
    UnknownPaymentLink(String),
    #[error("Payment link {0} was cancelled and can no longer be confirmed")]
    LinkCancelled(String),
    #[error("The requested co-payment {0} does not exist")]
    CoPaymentNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(String),
    /// The order intent cannot produce an order. Not retryable; the co-payment stays completed
    /// without an order and is flagged for manual reconciliation.
    #[error("Order intent integrity error: {0}")]
    DataIntegrity(String),
    /// A caller broke the materialization contract. A programming error, not a business error.
    #[error("Contract violation: {0}")]
    PreconditionViolation(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}
