use std::time::Duration;

use log::*;
use sfs_common::Secret;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: "rzp_test_00000000000000".to_string(),
            key_secret: Secret::default(),
            api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let key_id = std::env::var("SFS_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("🪛️ SFS_RAZORPAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_00000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("SFS_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SFS_RAZORPAY_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let api_url = std::env::var("SFS_RAZORPAY_API_URL").unwrap_or_else(|_| DEFAULT_RAZORPAY_API_URL.to_string());
        let timeout = std::env::var("SFS_RAZORPAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid SFS_RAZORPAY_TIMEOUT value '{s}'. {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { key_id, key_secret, api_url, timeout }
    }
}
