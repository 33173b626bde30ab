use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderNumber, PaymentStatus, SinglePaymentOutcome},
    traits::SettlementError,
};

/// Inserts a new order using the given connection. Not atomic on its own; embed the call in a
/// transaction and pass `&mut *tx` when atomicity with other writes is needed.
pub async fn insert_order(
    order: NewOrder,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, SettlementError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                vendor_id,
                total_amount,
                payment_status,
                payment_method,
                gateway_payment_id,
                delivery_address,
                line_items,
                estimated_delivery
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(user_id)
    .bind(order.vendor_id)
    .bind(order.total_amount)
    .bind(order.payment_status.to_string())
    .bind(order.payment_method)
    .bind(order.gateway_payment_id)
    .bind(order.delivery_address)
    .bind(order.line_items)
    .bind(order.estimated_delivery)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with id {}.", order.order_number, order.id);
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(number.as_str()).fetch_optional(conn).await
}

/// Flips a pending single-payment order to `Completed`, recording the gateway payment id.
/// The guarded update makes redeliveries observable as no-ops.
pub async fn confirm_single_payment(
    number: &OrderNumber,
    gateway_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<SinglePaymentOutcome, SettlementError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Completed',
                gateway_payment_id = $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $2 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(gateway_payment_id)
    .bind(number.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = updated {
        return Ok(SinglePaymentOutcome::Confirmed(order));
    }
    let order = fetch_order_by_number(number, conn)
        .await?
        .ok_or_else(|| SettlementError::OrderNotFound(number.to_string()))?;
    match order.payment_status {
        PaymentStatus::Completed => Ok(SinglePaymentOutcome::AlreadyCompleted(order)),
        PaymentStatus::Cancelled => Ok(SinglePaymentOutcome::Cancelled(order)),
        PaymentStatus::Pending => {
            // The guarded update found nothing, yet the order reads Pending: a concurrent writer
            // must have raced us. Treat as a transient storage condition and let the gateway retry.
            Err(SettlementError::DatabaseError(format!("conflicting concurrent update on order {number}")))
        },
    }
}

/// Marks a pending single-payment order as cancelled. Already-paid orders are left untouched.
pub async fn cancel_single_order(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Order, SettlementError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $1 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(number.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(order) => Ok(order),
        None => fetch_order_by_number(number, conn)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(number.to_string())),
    }
}
