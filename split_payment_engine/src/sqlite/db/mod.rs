//! Per-table query modules. These functions take a `SqliteConnection` so that callers can compose
//! them inside a transaction by passing `&mut *tx`.
pub mod co_payments;
pub mod orders;
pub mod splits;
pub mod users;
pub mod vendors;
