use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentSplit, PaymentSplit},
    traits::SettlementError,
};

pub async fn fetch_split_by_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentSplit>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_splits WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// Inserts the settlement ledger row, returning `false` in the second parameter if a split for
/// the order already exists.
pub async fn idempotent_insert(
    split: NewPaymentSplit,
    conn: &mut SqliteConnection,
) -> Result<(PaymentSplit, bool), SettlementError> {
    if let Some(existing) = fetch_split_by_order(split.order_id, &mut *conn).await? {
        debug!("🗃️ A payment split for order id {} already exists. Keeping it.", split.order_id);
        return Ok((existing, false));
    }
    let record: PaymentSplit = sqlx::query_as(
        r#"
            INSERT INTO payment_splits (
                order_id,
                total_amount,
                platform_amount,
                vendor_amount,
                platform_payout_ref,
                vendor_payout_ref,
                status,
                platform_leg_status,
                vendor_leg_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(split.order_id)
    .bind(split.total_amount)
    .bind(split.platform_amount)
    .bind(split.vendor_amount)
    .bind(split.platform_payout_ref)
    .bind(split.vendor_payout_ref)
    .bind(split.status.to_string())
    .bind(split.platform_leg_status)
    .bind(split.vendor_leg_status)
    .fetch_one(conn)
    .await?;
    Ok((record, true))
}
