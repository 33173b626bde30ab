//! Small shared utilities for the engine.

use std::{fmt::Display, future::Future};

use chrono::Utc;
use log::warn;
use rand::Rng;

use crate::db_types::OrderNumber;

const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generates a fresh human-readable order number, e.g. `ORD-20240611-7F3K`.
///
/// The date prefix keeps numbers roughly sortable; the random suffix makes collisions on the
/// unique index vanishingly unlikely within a day.
pub fn generate_order_number() -> OrderNumber {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..4).map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char).collect();
    OrderNumber(format!("ORD-{}-{suffix}", Utc::now().format("%Y%m%d")))
}

/// Builds the caller-generated reference for one payout leg from the leg name, order number and
/// current timestamp. The provider treats it as an idempotency key.
pub fn payout_reference(leg: &str, order_number: &OrderNumber) -> String {
    format!("{leg}-{}-{}", order_number.as_str(), Utc::now().timestamp())
}

/// Awaits a best-effort side effect, logging and swallowing any error.
///
/// Settlement and notification must never fail the webhook response once the order itself is
/// safely created; routing them through this helper makes that contract structural instead of
/// a convention at each call site.
pub async fn best_effort<T, E, F>(label: &str, fut: F) -> Option<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match fut.await {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("🧯️ Best-effort step '{label}' failed and was swallowed. {e}");
            None
        },
    }
}
