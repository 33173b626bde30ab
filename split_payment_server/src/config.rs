use std::env;

use log::*;
use payout_tools::PayoutConfig;
use spg_common::{parse_boolean_flag, Secret};
use split_payment_engine::{
    db_types::PayoutProfile,
    SplitConfig,
};

const DEFAULT_SPS_HOST: &str = "127.0.0.1";
const DEFAULT_SPS_PORT: u16 = 8480;
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Webhook authentication settings for the gateway-facing endpoints.
    pub webhook: WebhookConfig,
    /// The platform/vendor split percentages and the platform's own payout destination.
    pub split: SplitConfig,
    /// Credentials for the payout provider's REST API.
    pub payouts: PayoutConfig,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    /// The header carrying the hex-encoded HMAC-SHA256 of the raw request body.
    pub signature_header: String,
    pub hmac_secret: Secret<String>,
    /// If false, the server will not verify webhook signatures at all. **DANGER**
    pub verify_signatures: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPS_HOST.to_string(),
            port: DEFAULT_SPS_PORT,
            database_url: String::default(),
            webhook: WebhookConfig::default(),
            split: SplitConfig::default(),
            payouts: PayoutConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPS_HOST").ok().unwrap_or_else(|| DEFAULT_SPS_HOST.into());
        let port = env::var("SPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPS_PORT. {e} Using the default, {DEFAULT_SPS_PORT}, instead."
                    );
                    DEFAULT_SPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPS_PORT);
        let database_url = env::var("SPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPS_DATABASE_URL is not set. Please set it to the URL for the settlement database.");
            String::default()
        });
        let webhook = WebhookConfig::from_env_or_default();
        let split = split_config_from_env();
        let payouts = PayoutConfig::new_from_env_or_default();
        Self { host, port, database_url, webhook, split, payouts }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let signature_header =
            env::var("SPS_SIGNATURE_HEADER").ok().unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.to_string());
        let hmac_secret = Secret::new(env::var("SPS_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SPS_WEBHOOK_SECRET not set. Incoming webhooks will not authenticate against this server.");
            String::default()
        }));
        let disabled = parse_boolean_flag(env::var("SPS_DISABLE_WEBHOOK_SIGNATURES").ok(), false);
        if disabled {
            warn!(
                "🚨️🚨️🚨️ Webhook signature checks are DISABLED. Anyone can mark payments as complete. Do NOT run \
                 production like this. 🚨️🚨️🚨️"
            );
        }
        Self { signature_header, hmac_secret, verify_signatures: !disabled }
    }
}

/// Reads the split percentages and the platform payout profile from the environment. Percentages
/// that do not add up to 100 are rejected in favour of the 20/80 default.
fn split_config_from_env() -> SplitConfig {
    let defaults = SplitConfig::default();
    let platform_percent = read_percent("SPS_PLATFORM_PERCENT", defaults.platform_percent);
    let vendor_percent = read_percent("SPS_VENDOR_PERCENT", defaults.vendor_percent);
    let (platform_percent, vendor_percent) = if platform_percent.saturating_add(vendor_percent) == 100 {
        (platform_percent, vendor_percent)
    } else {
        error!(
            "🪛️ SPS_PLATFORM_PERCENT ({platform_percent}) and SPS_VENDOR_PERCENT ({vendor_percent}) must add up to \
             100. Using the defaults, {}/{}, instead.",
            defaults.platform_percent, defaults.vendor_percent
        );
        (defaults.platform_percent, defaults.vendor_percent)
    };
    let platform_profile = PayoutProfile {
        beneficiary_name: env::var("SPS_PLATFORM_BENEFICIARY").unwrap_or_default(),
        account_number: env::var("SPS_PLATFORM_ACCOUNT_NUMBER").unwrap_or_default(),
        ifsc_code: env::var("SPS_PLATFORM_IFSC").unwrap_or_default(),
    };
    if !platform_profile.is_complete() {
        warn!(
            "🪛️ The platform payout profile is incomplete (SPS_PLATFORM_BENEFICIARY / SPS_PLATFORM_ACCOUNT_NUMBER / \
             SPS_PLATFORM_IFSC). The platform leg of every settlement will be skipped."
        );
    }
    SplitConfig { platform_percent, vendor_percent, platform_profile }
}

fn read_percent(var: &str, default: u8) -> u8 {
    match env::var(var) {
        Ok(s) => s.parse::<u8>().ok().filter(|p| *p <= 100).unwrap_or_else(|| {
            error!("🪛️ {s} is not a valid percentage for {var}. Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}
