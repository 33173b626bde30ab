use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the hex-encoded HMAC-SHA256 of `data` under `secret`, matching what the gateway puts
/// in the signature header.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex-encoded signature against the raw request body in constant time. A signature
/// that is not valid hex fails outright.
pub fn verify_signature(secret: &str, data: &[u8], signature: &str) -> bool {
    let sig = match hex::decode(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.verify_slice(&sig).is_ok()
}
