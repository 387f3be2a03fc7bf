use std::env;

use log::*;
use rand::RngCore;
use razorpay_tools::RazorpayConfig;
use sfs_common::{helpers::parse_boolean_flag, Secret, DEFAULT_CURRENCY_CODE};

const DEFAULT_SFS_HOST: &str = "127.0.0.1";
const DEFAULT_SFS_PORT: u16 = 8000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_LOGIN_URL: &str = "/accounts/login/";
pub const DEFAULT_SESSION_COOKIE: &str = "sfs_session";
const DEFAULT_MAIL_FROM: &str = "orders@localhost";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Shared secret with the upstream login service. It signs the `X-Storefront-User` header.
    pub identity_secret: Secret<String>,
    /// Where anonymous visitors are sent when they try to check out.
    pub login_url: String,
    /// Name of the cookie that carries the anonymous cart session token
    pub session_cookie: String,
    pub secure_cookies: bool,
    /// The currency payment intents are opened in, unless the request names one
    pub currency: String,
    /// Sender address for order confirmation emails
    pub mail_from: String,
    pub razorpay: RazorpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFS_HOST.to_string(),
            port: DEFAULT_SFS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            identity_secret: random_identity_secret(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            secure_cookies: false,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            razorpay: RazorpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SFS_HOST").ok().unwrap_or_else(|| DEFAULT_SFS_HOST.into());
        let port = env::var("SFS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SFS_PORT. {e} Using the default, {DEFAULT_SFS_PORT}, instead."
                    );
                    DEFAULT_SFS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SFS_PORT);
        let database_url = env::var("SFS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SFS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let identity_secret = env::var("SFS_IDENTITY_SECRET").ok().filter(|s| !s.is_empty()).map(Secret::new);
        let identity_secret = identity_secret.unwrap_or_else(random_identity_secret);
        let login_url = env::var("SFS_LOGIN_URL").ok().unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
        let session_cookie = env::var("SFS_SESSION_COOKIE").ok().unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        let secure_cookies = parse_boolean_flag(env::var("SFS_SECURE_COOKIES").ok(), false);
        let currency = env::var("SFS_CURRENCY")
            .map(|s| s.trim().to_uppercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let mail_from = env::var("SFS_MAIL_FROM").ok().unwrap_or_else(|| {
            info!("🪛️ SFS_MAIL_FROM is not set. Confirmation emails will be sent from {DEFAULT_MAIL_FROM}");
            DEFAULT_MAIL_FROM.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SFS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SFS_USE_FORWARDED").ok(), false);
        let razorpay = RazorpayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            identity_secret,
            login_url,
            session_cookie,
            secure_cookies,
            currency,
            mail_from,
            razorpay,
        }
    }
}

fn random_identity_secret() -> Secret<String> {
    warn!(
        "🚨️🚨️🚨️ SFS_IDENTITY_SECRET has not been set. I'm using a random value for this session, so no upstream login \
         service will be able to vouch for its users. Set SFS_IDENTITY_SECRET in production. 🚨️🚨️🚨️"
    );
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    Secret::new(hex::encode(key))
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that the request handlers need. Secrets are deliberately left out.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub login_url: String,
    pub currency: String,
    /// The public Razorpay key id, handed to the browser checkout widget
    pub razorpay_key_id: String,
}

impl ServerOptions {
    /// `razorpay_key_id` comes from the gateway, rather than the configuration, so that the browser widget and the
    /// server always use the same account.
    pub fn from_config(config: &ServerConfig, razorpay_key_id: String) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            login_url: config.login_url.clone(),
            currency: config.currency.clone(),
            razorpay_key_id,
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            use_x_forwarded_for: false,
            use_forwarded: false,
            login_url: DEFAULT_LOGIN_URL.to_string(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            razorpay_key_id: RazorpayConfig::default().key_id,
        }
    }
}
