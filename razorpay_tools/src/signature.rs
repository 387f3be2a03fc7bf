use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Calculates the checkout signature Razorpay attaches to a successful payment: the hex-encoded HMAC-SHA256 of
/// `"{order_id}|{payment_id}"`, keyed with the merchant's key secret.
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    signing_mac(key_secret, order_id, payment_id).map(|mac| hex::encode(mac.finalize().into_bytes())).unwrap_or_default()
}

/// Checks a checkout signature in constant time. Malformed (non-hex) signatures simply fail verification.
pub fn verify_payment_signature(key_secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(signature) = hex::decode(signature.trim()) else {
        debug!("🔐️ Payment signature for {order_id} is not valid hex");
        return false;
    };
    signing_mac(key_secret, order_id, payment_id).map(|mac| mac.verify_slice(&signature).is_ok()).unwrap_or(false)
}

// HMAC accepts keys of any length, so this only fails if the hash implementation is broken.
fn signing_mac(key_secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes()).ok()?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    Some(mac)
}
