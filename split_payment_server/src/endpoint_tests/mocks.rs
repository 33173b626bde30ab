use mockall::mock;
use split_payment_engine::{
    db_types::{
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
    },
    traits::{Notifier, NotifyError, SettlementDatabase, SettlementError},
};

mock! {
    pub SettlementDb {}
    impl SettlementDatabase for SettlementDb {
        fn url(&self) -> &str;
        async fn insert_co_payment(&self, co_payment: NewCoPayment) -> Result<CoPayment, SettlementError>;
        async fn fetch_co_payment(&self, id: i64) -> Result<Option<CoPayment>, SettlementError>;
        async fn fetch_contributor_by_link(&self, link_id: &str) -> Result<Option<Contributor>, SettlementError>;
        async fn confirm_contributor(&self, link_id: &str) -> Result<ConfirmationOutcome, SettlementError>;
        async fn cancel_payment_link(&self, link_id: &str) -> Result<Option<Contributor>, SettlementError>;
        async fn materialize_order(&self, co_payment_id: i64, order: NewOrder) -> Result<MaterializeOutcome, SettlementError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementError>;
        async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, SettlementError>;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, SettlementError>;
        async fn confirm_single_order_payment(&self, number: &OrderNumber, gateway_payment_id: &str) -> Result<SinglePaymentOutcome, SettlementError>;
        async fn cancel_single_order(&self, number: &OrderNumber) -> Result<Order, SettlementError>;
        async fn fetch_payout_profile(&self, vendor_id: i64) -> Result<Option<PayoutProfile>, SettlementError>;
        async fn upsert_payout_profile(&self, vendor_id: i64, profile: &PayoutProfile) -> Result<(), SettlementError>;
        async fn insert_payment_split(&self, split: NewPaymentSplit) -> Result<(PaymentSplit, bool), SettlementError>;
        async fn fetch_payment_split(&self, order_id: i64) -> Result<Option<PaymentSplit>, SettlementError>;
        async fn close(&mut self) -> Result<(), SettlementError>;
    }
    impl Clone for SettlementDb {
        fn clone(&self) -> Self;
    }
}

mock! {
    pub Notify {}
    impl Notifier for Notify {
        async fn notify_customer(&self, order: &Order) -> Result<(), NotifyError>;
        async fn notify_vendor(&self, order: &Order) -> Result<(), NotifyError>;
    }
}
