//! The collaborator seams of the engine.
//!
//! [`SettlementDatabase`] is the repository over all shared mutable state. [`PayoutProvider`] and
//! [`Notifier`] are the outbound seams; both are best-effort relative to order creation and are
//! injected by the server so tests can substitute doubles.
mod notifications;
mod payouts;
mod settlement_database;

pub use notifications::{Notifier, NotifyError};
pub use payouts::{PayoutInstruction, PayoutProvider, PayoutProviderError, PayoutReceipt};
pub use settlement_database::{SettlementDatabase, SettlementError};
