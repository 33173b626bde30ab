use log::*;
use spg_common::{parse_boolean_flag, Secret};

#[derive(Debug, Clone, Default)]
pub struct PayoutConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// When set, no requests leave the process; payouts are acknowledged locally. For
    /// development and tests only.
    pub simulate: bool,
}

impl PayoutConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SPS_PAYOUT_BASE_URL").unwrap_or_else(|_| {
            warn!("SPS_PAYOUT_BASE_URL not set, using (probably useless) default");
            "https://api.payouts.example.com/v1".to_string()
        });
        let key_id = std::env::var("SPS_PAYOUT_KEY_ID").unwrap_or_else(|_| {
            warn!("SPS_PAYOUT_KEY_ID not set, using (probably useless) default");
            "key_00000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("SPS_PAYOUT_KEY_SECRET").unwrap_or_else(|_| {
            warn!("SPS_PAYOUT_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let simulate = parse_boolean_flag(std::env::var("SPS_PAYOUT_SIMULATE").ok(), false);
        if simulate {
            warn!("🚨️🚨️🚨️ Payout simulation mode is ON. No money will move. Do NOT run production like this. 🚨️🚨️🚨️");
        }
        Self { base_url, key_id, key_secret, simulate }
    }
}
