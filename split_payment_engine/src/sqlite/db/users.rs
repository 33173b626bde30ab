use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::CustomerDetails, traits::SettlementError};

/// Resolves the user id for the given email, creating the record if it does not exist yet.
/// Idempotent: repeated materialization attempts for the same email never create duplicates.
pub async fn fetch_or_create_user(
    customer: &CustomerDetails,
    conn: &mut SqliteConnection,
) -> Result<i64, SettlementError> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1").bind(&customer.email).fetch_optional(&mut *conn).await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }
    let (id,): (i64,) = sqlx::query_as(
        r#"
            INSERT INTO users (email, name, phone) VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET email = excluded.email
            RETURNING id;
        "#,
    )
    .bind(&customer.email)
    .bind(&customer.name)
    .bind(&customer.phone)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Created user #{id} for {}.", customer.email);
    Ok(id)
}
