use sqlx::SqliteConnection;

use crate::{db_types::PayoutProfile, traits::SettlementError};

pub async fn fetch_payout_profile(
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PayoutProfile>, sqlx::Error> {
    sqlx::query_as(
        "SELECT beneficiary_name, account_number, ifsc_code FROM vendor_payout_profiles WHERE vendor_id = $1",
    )
    .bind(vendor_id)
    .fetch_optional(conn)
    .await
}

pub async fn upsert_payout_profile(
    vendor_id: i64,
    profile: &PayoutProfile,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    sqlx::query(
        r#"
            INSERT INTO vendor_payout_profiles (vendor_id, beneficiary_name, account_number, ifsc_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (vendor_id) DO UPDATE SET
                beneficiary_name = excluded.beneficiary_name,
                account_number = excluded.account_number,
                ifsc_code = excluded.ifsc_code,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(vendor_id)
    .bind(&profile.beneficiary_name)
    .bind(&profile.account_number)
    .bind(&profile.ifsc_code)
    .execute(conn)
    .await?;
    Ok(())
}
