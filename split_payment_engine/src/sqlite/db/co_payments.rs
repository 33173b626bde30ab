use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{CoPayment, CoPaymentStatus, Contributor, NewCoPayment},
    traits::SettlementError,
};

pub async fn insert_co_payment(
    co_payment: NewCoPayment,
    conn: &mut SqliteConnection,
) -> Result<CoPayment, SettlementError> {
    let record: CoPayment = sqlx::query_as(
        r#"
            INSERT INTO co_payments (total_amount, order_intent)
            VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(co_payment.total_amount)
    .bind(co_payment.order_intent)
    .fetch_one(&mut *conn)
    .await?;
    for contributor in co_payment.contributors {
        sqlx::query(
            r#"
                INSERT INTO contributors (co_payment_id, email, amount_owed, payment_link_id)
                VALUES ($1, $2, $3, $4);
            "#,
        )
        .bind(record.id)
        .bind(contributor.email)
        .bind(contributor.amount_owed)
        .bind(contributor.payment_link_id)
        .execute(&mut *conn)
        .await?;
    }
    debug!("🗃️ Co-payment #{} saved with its contributors.", record.id);
    Ok(record)
}

pub async fn fetch_co_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<CoPayment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM co_payments WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_contributor_by_link(
    link_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM contributors WHERE payment_link_id = $1").bind(link_id).fetch_optional(conn).await
}

/// Marks the contributor as paid if it is still pending. Returns the up-to-date row and whether
/// this call changed it. A cancelled link is never confirmable.
pub async fn mark_contributor_paid(
    link_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(Contributor, bool), SettlementError> {
    let contributor = fetch_contributor_by_link(link_id, &mut *conn)
        .await?
        .ok_or_else(|| SettlementError::UnknownPaymentLink(link_id.to_string()))?;
    if contributor.cancelled_at.is_some() {
        return Err(SettlementError::LinkCancelled(link_id.to_string()));
    }
    let updated: Option<Contributor> = sqlx::query_as(
        r#"
            UPDATE contributors SET status = 'Paid', paid_at = CURRENT_TIMESTAMP
            WHERE payment_link_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(link_id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(c) => Ok((c, true)),
        None => Ok((contributor, false)),
    }
}

/// Records the gateway-side cancellation of a payment link. A no-op for an already-paid
/// contributor: the money has been collected and the share stays paid.
pub async fn cancel_payment_link(
    link_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Contributor>, SettlementError> {
    let updated: Option<Contributor> = sqlx::query_as(
        r#"
            UPDATE contributors SET cancelled_at = COALESCE(cancelled_at, CURRENT_TIMESTAMP)
            WHERE payment_link_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(link_id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(c) => Ok(Some(c)),
        None => Ok(fetch_contributor_by_link(link_id, conn).await?),
    }
}

/// Recomputes the co-payment's status from its contributor set and returns the fresh record
/// together with the paid/total counts. Must run in the same transaction as the confirmation it
/// follows, so two concurrent final confirmations cannot both observe "not yet complete".
pub async fn advance_co_payment_status(
    co_payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(CoPayment, i64, i64), SettlementError> {
    let (total, paid): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(status = 'Paid'), 0) FROM contributors WHERE co_payment_id = $1",
    )
    .bind(co_payment_id)
    .fetch_one(&mut *conn)
    .await?;
    let status = if paid == total && total > 0 {
        CoPaymentStatus::Completed
    } else if paid > 0 {
        CoPaymentStatus::Partial
    } else {
        CoPaymentStatus::Pending
    };
    trace!("🗃️ Co-payment #{co_payment_id}: {paid}/{total} contributors paid, advancing to {status}.");
    let record: Option<CoPayment> = sqlx::query_as(
        r#"
            UPDATE co_payments SET
                status = $1,
                completed_at = CASE WHEN $1 = 'Completed' THEN COALESCE(completed_at, CURRENT_TIMESTAMP) ELSE completed_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(co_payment_id)
    .fetch_optional(&mut *conn)
    .await?;
    let record = record.ok_or(SettlementError::CoPaymentNotFound(co_payment_id))?;
    Ok((record, paid, total))
}

/// The atomic order claim. Returns true if this call linked the order, false if another
/// materialization already owns the slot.
pub async fn claim_order_slot(
    co_payment_id: i64,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SettlementError> {
    let result = sqlx::query(
        "UPDATE co_payments SET order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND order_id IS NULL",
    )
    .bind(order_id)
    .bind(co_payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
