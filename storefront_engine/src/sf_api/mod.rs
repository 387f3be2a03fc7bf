//! The public API of the storefront engine.
//!
//! Each API object wraps a backend (anything implementing the traits in [`crate::traits`]) and exposes the
//! operations the HTTP layer needs. Actor identity is always an explicit argument.
pub mod cart_api;
pub mod checkout_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
