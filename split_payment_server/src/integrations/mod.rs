pub mod notify;
pub mod payouts;
