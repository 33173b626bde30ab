//! Split Payment Engine
//!
//! The split payment engine coordinates co-payment settlement for the marketplace: several
//! independent contributors each pay their share of one prospective order through the payment
//! gateway, and once every share is confirmed the engine materializes a single order exactly once
//! and computes the platform/vendor payout split.
//!
//! The library is divided into two main sections:
//! 1. Database management ([`mod@sqlite`]). SQLite is the supported backend. You should never need
//!    to access the database directly; use the public APIs instead. The exception is the data
//!    types, which are defined in [`mod@db_types`] and are public.
//! 2. The engine public API ([`mod@spe_api`]). [`SettlementFlowApi`] drives the co-payment state
//!    machine and order materialization in response to gateway webhook events, and
//!    [`SettlementApi`] computes and disburses the payout split. Backends implement the traits in
//!    [`mod@traits`] to plug into these APIs.
//!
//! Everything is keyed off the gateway's payment-link identifier, which is the only value the
//! gateway reliably round-trips through webhook redeliveries.
pub mod db_types;
pub mod helpers;
pub mod order_intent;
mod spe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use spe_api::{
    settlement_api::{LegOutcome, SettlementApi, SplitConfig},
    settlement_flow_api::{CancelOutcome, PaidOutcome, SettlementFlowApi, CO_PAYMENT_METHOD, PAYMENT_LINK_METHOD},
};
pub use traits::{SettlementDatabase, SettlementError};
