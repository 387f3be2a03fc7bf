mod identity;
mod session;

pub use identity::{IdentityMiddlewareFactory, IdentityMiddlewareService, USER_HEADER, USER_SIGNATURE_HEADER};
pub use session::{SessionMiddlewareFactory, SessionMiddlewareService};
