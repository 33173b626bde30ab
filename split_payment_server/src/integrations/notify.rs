use log::info;
use split_payment_engine::{
    db_types::Order,
    traits::{Notifier, NotifyError},
};

/// A [`Notifier`] that only writes to the log. Stands in until a real email/SMS integration is
/// wired up; the settlement flow does not care which one it talks to.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify_customer(&self, order: &Order) -> Result<(), NotifyError> {
        info!(
            "📧️ [customer, user #{}] Your order {} is confirmed. Estimated delivery: {}.",
            order.user_id, order.order_number, order.estimated_delivery
        );
        Ok(())
    }

    async fn notify_vendor(&self, order: &Order) -> Result<(), NotifyError> {
        info!(
            "📧️ [vendor #{}] New order {} for {} to {}.",
            order.vendor_id, order.order_number, order.total_amount, order.delivery_address
        );
        Ok(())
    }
}
