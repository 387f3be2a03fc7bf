mod api;
mod config;
mod data_objects;
mod error;
mod signature;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{NewRazorpayOrder, RazorpayErrorDetail, RazorpayErrorResponse, RazorpayOrder};
pub use error::RazorpayApiError;
pub use signature::{payment_signature, verify_payment_signature};
