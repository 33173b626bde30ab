//! A thin client for the payout provider's REST API, used to disburse the platform and vendor
//! shares of a settled order to their bank accounts.

mod api;
mod config;
mod error;

mod data_objects;

pub use api::PayoutApi;
pub use config::PayoutConfig;
pub use data_objects::{PayoutRequest, PayoutResponse, PAYOUT_MODE_NEFT};
pub use error::PayoutApiError;
