use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use spg_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct StatusConversionError(String);

//--------------------------------     ContributorStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ContributorStatus {
    /// The contributor's payment link has been issued but not paid yet.
    Pending,
    /// The gateway has confirmed payment of this contributor's share. Terminal.
    Paid,
}

impl Display for ContributorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContributorStatus::Pending => write!(f, "Pending"),
            ContributorStatus::Paid => write!(f, "Paid"),
        }
    }
}

impl FromStr for ContributorStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for ContributorStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid contributor status: {value}. But this conversion cannot fail. Defaulting to Pending");
            ContributorStatus::Pending
        })
    }
}

//--------------------------------       Contributor        -----------------------------------------------------------
/// One payer's share of a co-payment.
///
/// The `payment_link_id` is the gateway-issued token for this contributor's checkout session, and
/// is the idempotency key for all webhook processing.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contributor {
    pub id: i64,
    pub co_payment_id: i64,
    pub email: String,
    pub amount_owed: Money,
    pub status: ContributorStatus,
    pub payment_link_id: String,
    pub paid_at: Option<DateTime<Utc>>,
    /// Set when the gateway reports the payment link as cancelled or expired. A cancelled link can
    /// never be confirmed, even by a stale "paid" replay.
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContributor {
    pub email: String,
    pub amount_owed: Money,
    pub payment_link_id: String,
}

//--------------------------------      CoPaymentStatus      ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CoPaymentStatus {
    /// No contributor has paid yet.
    Pending,
    /// At least one, but not all, contributors have paid.
    Partial,
    /// Every contributor has paid. A completed co-payment is never reopened.
    Completed,
}

impl Display for CoPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoPaymentStatus::Pending => write!(f, "Pending"),
            CoPaymentStatus::Partial => write!(f, "Partial"),
            CoPaymentStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for CoPaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Partial" => Ok(Self::Partial),
            "Completed" => Ok(Self::Completed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for CoPaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid co-payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            CoPaymentStatus::Pending
        })
    }
}

//--------------------------------        CoPayment          ----------------------------------------------------------
/// The aggregate covering all contributors for one prospective order.
///
/// `order_id` is set at most once, and only after the co-payment has completed. The atomic
/// "set `order_id` if currently NULL" update in the backend is the single duplicate-order gate.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CoPayment {
    pub id: i64,
    pub total_amount: Money,
    pub status: CoPaymentStatus,
    /// The serialized order intent. Parse with [`crate::order_intent::OrderIntent`].
    pub order_intent: String,
    pub order_id: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCoPayment {
    pub total_amount: Money,
    pub order_intent: String,
    pub contributors: Vec<NewContributor>,
}

/// The state of a co-payment immediately after a contributor confirmation has been applied,
/// computed in the same transaction as the confirmation itself.
#[derive(Debug, Clone)]
pub struct ConfirmationOutcome {
    pub contributor: Contributor,
    pub co_payment: CoPayment,
    /// False if this confirmation was a redelivery of an already-applied event.
    pub freshly_paid: bool,
    /// True if every contributor of the co-payment is now paid.
    pub all_paid: bool,
}

//--------------------------------       PaymentStatus       ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The order exists but the money has not been collected yet (single-payment checkout).
    Pending,
    /// The gateway has collected the money in full.
    Completed,
    /// The payment link backing the order was cancelled before payment. Terminal.
    Cancelled,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------        OrderNumber        ----------------------------------------------------------
/// The human-readable, unique order reference (e.g. `ORD-20240611-7F3K`).
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------          Order            ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub vendor_id: i64,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    /// How the order was paid: `co_payment` or `payment_link`.
    pub payment_method: String,
    pub gateway_payment_id: Option<String>,
    pub delivery_address: String,
    /// JSON snapshot of the line items at the time of ordering.
    pub line_items: String,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer: CustomerDetails,
    pub vendor_id: i64,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub gateway_payment_id: Option<String>,
    pub delivery_address: String,
    pub line_items: String,
    pub estimated_delivery: DateTime<Utc>,
}

/// The outcome of an order materialization attempt. `AlreadyMaterialized` carries the order that a
/// previous (or concurrent) materialization produced.
#[derive(Debug, Clone)]
pub enum MaterializeOutcome {
    Created(Order),
    AlreadyMaterialized(Order),
}

impl MaterializeOutcome {
    pub fn into_order(self) -> Order {
        match self {
            MaterializeOutcome::Created(o) | MaterializeOutcome::AlreadyMaterialized(o) => o,
        }
    }
}

/// The outcome of confirming a single-payment order via its payment link webhook.
#[derive(Debug, Clone)]
pub enum SinglePaymentOutcome {
    Confirmed(Order),
    /// A redelivery; the order was already marked as paid.
    AlreadyCompleted(Order),
    /// The order's payment link was cancelled before this event was applied. Terminal.
    Cancelled(Order),
}

//--------------------------------          User             ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

//--------------------------------       PayoutProfile       ----------------------------------------------------------
/// Destination bank details for one payout leg. A leg whose profile is incomplete is skipped
/// rather than failing the settlement.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct PayoutProfile {
    pub beneficiary_name: String,
    pub account_number: String,
    pub ifsc_code: String,
}

impl PayoutProfile {
    pub fn is_complete(&self) -> bool {
        !self.beneficiary_name.is_empty() && !self.account_number.is_empty() && !self.ifsc_code.is_empty()
    }
}

//--------------------------------        SplitStatus        ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SplitStatus {
    /// At least one payout leg was handed to the provider.
    Processing,
    /// No leg could be handed to the provider.
    Failed,
}

impl Display for SplitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitStatus::Processing => write!(f, "Processing"),
            SplitStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl From<String> for SplitStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Processing" => Self::Processing,
            "Failed" => Self::Failed,
            _ => {
                error!("Invalid split status: {value}. But this conversion cannot fail. Defaulting to Failed");
                Self::Failed
            },
        }
    }
}

//--------------------------------       PaymentSplit        ----------------------------------------------------------
/// The settlement ledger entry for one order. Written once, immediately after materialization;
/// reconciliation of in-flight payouts happens out of band.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub id: i64,
    pub order_id: i64,
    pub total_amount: Money,
    pub platform_amount: Money,
    pub vendor_amount: Money,
    pub platform_payout_ref: Option<String>,
    pub vendor_payout_ref: Option<String>,
    pub status: SplitStatus,
    pub platform_leg_status: String,
    pub vendor_leg_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentSplit {
    pub order_id: i64,
    pub total_amount: Money,
    pub platform_amount: Money,
    pub vendor_amount: Money,
    pub platform_payout_ref: Option<String>,
    pub vendor_payout_ref: Option<String>,
    pub status: SplitStatus,
    pub platform_leg_status: String,
    pub vendor_leg_status: String,
}
