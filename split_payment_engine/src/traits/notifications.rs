use thiserror::Error;

use crate::db_types::Order;

/// Fire-and-forget notification dispatch. Failures are logged by the caller and never affect the
/// order flow; there is no ordering guarantee between notification and settlement.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify_customer(&self, order: &Order) -> Result<(), NotifyError>;
    async fn notify_vendor(&self, order: &Order) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Error)]
#[error("Notification could not be dispatched: {0}")]
pub struct NotifyError(pub String);
