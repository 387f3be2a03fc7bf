//! Request-scoped identity.
//!
//! The middleware in [`crate::middleware`] decides who is making a request and stores the answer in the request
//! extensions. Handlers pull it back out through the extractors defined here, so the acting user or session is
//! always an explicit handler argument.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use log::trace;
use storefront_engine::db_types::Actor;

use crate::errors::{AuthError, ServerError};

/// A user whose id was vouched for by the upstream login service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i64);

/// The anonymous cart session token for visitors who are not logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// Whoever owns the cart for this request: the logged-in user if there is one, otherwise the anonymous session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestActor(pub Actor);

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied();
        ready(user.ok_or(ServerError::AuthenticationError(AuthError::LoginRequired)))
    }
}

impl FromRequest for RequestActor {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let actor = if let Some(user) = extensions.get::<AuthenticatedUser>() {
            Ok(Actor::User(user.0))
        } else if let Some(session) = extensions.get::<SessionToken>() {
            Ok(Actor::Session(session.0.clone()))
        } else {
            trace!("🔐️ Request has neither a user nor a cart session");
            Err(ServerError::AuthenticationError(AuthError::NoSession))
        };
        ready(actor.map(RequestActor))
    }
}
