use std::fmt::Debug;

use log::*;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::{
    db_types::{
        CoPayment,
        CoPaymentStatus,
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
    sqlite::db::{co_payments, orders, splits, users, vendors},
    traits::{SettlementDatabase, SettlementError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool with the given URL and maximum number of
    /// connections.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_co_payment(&self, co_payment: NewCoPayment) -> Result<CoPayment, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let record = co_payments::insert_co_payment(co_payment, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn fetch_co_payment(&self, id: i64) -> Result<Option<CoPayment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(co_payments::fetch_co_payment(id, &mut conn).await?)
    }

    async fn fetch_contributor_by_link(&self, link_id: &str) -> Result<Option<Contributor>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(co_payments::fetch_contributor_by_link(link_id, &mut conn).await?)
    }

    /// Applies the confirmation and recomputes the co-payment status in one transaction, so the
    /// completeness decision always reflects the contributor set *after* this event.
    async fn confirm_contributor(&self, link_id: &str) -> Result<ConfirmationOutcome, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let (contributor, freshly_paid) = co_payments::mark_contributor_paid(link_id, &mut tx).await?;
        let (co_payment, paid, total) = co_payments::advance_co_payment_status(contributor.co_payment_id, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Confirmation of link [{link_id}] committed ({paid}/{total} paid).");
        Ok(ConfirmationOutcome { contributor, co_payment, freshly_paid, all_paid: paid == total })
    }

    async fn cancel_payment_link(&self, link_id: &str) -> Result<Option<Contributor>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        co_payments::cancel_payment_link(link_id, &mut conn).await
    }

    /// Creates the order and links it to the co-payment in a single transaction. The
    /// `WHERE order_id IS NULL` claim resolves materialization races: the losing transaction is
    /// rolled back (dropping its freshly inserted order) and the winner's order is returned.
    async fn materialize_order(
        &self,
        co_payment_id: i64,
        order: NewOrder,
    ) -> Result<MaterializeOutcome, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let co_payment = co_payments::fetch_co_payment(co_payment_id, &mut tx)
            .await?
            .ok_or(SettlementError::CoPaymentNotFound(co_payment_id))?;
        if let Some(order_id) = co_payment.order_id {
            let existing = orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or_else(|| {
                SettlementError::DatabaseError(format!(
                    "co-payment #{co_payment_id} points at order id {order_id}, which does not exist"
                ))
            })?;
            return Ok(MaterializeOutcome::AlreadyMaterialized(existing));
        }
        if co_payment.status != CoPaymentStatus::Completed {
            return Err(SettlementError::PreconditionViolation(format!(
                "cannot materialize co-payment #{co_payment_id} in status {}",
                co_payment.status
            )));
        }
        let user_id = users::fetch_or_create_user(&order.customer, &mut tx).await?;
        let record = orders::insert_order(order, user_id, &mut tx).await?;
        if co_payments::claim_order_slot(co_payment_id, record.id, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Order {} linked to co-payment #{co_payment_id}.", record.order_number);
            return Ok(MaterializeOutcome::Created(record));
        }
        // A concurrent materialization claimed the slot first. Roll back our order and hand the
        // winner's back.
        drop(tx);
        let mut conn = self.pool.acquire().await?;
        let winner = co_payments::fetch_co_payment(co_payment_id, &mut conn)
            .await?
            .and_then(|cp| cp.order_id)
            .ok_or_else(|| {
                SettlementError::DatabaseError(format!(
                    "order claim for co-payment #{co_payment_id} failed but no order is linked"
                ))
            })?;
        let existing = orders::fetch_order_by_id(winner, &mut conn).await?.ok_or_else(|| {
            SettlementError::DatabaseError(format!("linked order id {winner} does not exist"))
        })?;
        Ok(MaterializeOutcome::AlreadyMaterialized(existing))
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let user_id = users::fetch_or_create_user(&order.customer, &mut tx).await?;
        let record = orders::insert_order(order, user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_id(id, &mut conn).await?)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_number(number, &mut conn).await?)
    }

    async fn confirm_single_order_payment(
        &self,
        number: &OrderNumber,
        gateway_payment_id: &str,
    ) -> Result<SinglePaymentOutcome, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::confirm_single_payment(number, gateway_payment_id, &mut conn).await
    }

    async fn cancel_single_order(&self, number: &OrderNumber) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::cancel_single_order(number, &mut conn).await
    }

    async fn fetch_payout_profile(&self, vendor_id: i64) -> Result<Option<PayoutProfile>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(vendors::fetch_payout_profile(vendor_id, &mut conn).await?)
    }

    async fn upsert_payout_profile(&self, vendor_id: i64, profile: &PayoutProfile) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        vendors::upsert_payout_profile(vendor_id, profile, &mut conn).await
    }

    async fn insert_payment_split(&self, split: NewPaymentSplit) -> Result<(PaymentSplit, bool), SettlementError> {
        let mut tx = self.pool.begin().await?;
        let result = splits::idempotent_insert(split, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_payment_split(&self, order_id: i64) -> Result<Option<PaymentSplit>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(splits::fetch_split_by_order(order_id, &mut conn).await?)
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}
