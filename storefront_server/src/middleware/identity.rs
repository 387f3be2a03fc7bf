//! Identity middleware for Actix Web.
//!
//! Logins are handled by an upstream service. It forwards the id of the logged-in user in the `X-Storefront-User`
//! header, and signs that value with HMAC-SHA256 using the shared `SFS_IDENTITY_SECRET`. The hex-encoded signature is
//! provided in the `X-Storefront-User-Signature` header.
//!
//! Requests without the user header pass through as anonymous. Requests that carry the header with a missing or
//! invalid signature are rejected with a 401.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use sfs_common::Secret;

use crate::{
    auth::AuthenticatedUser,
    errors::{AuthError, ServerError},
    helpers::verify_hmac,
};

pub const USER_HEADER: &str = "X-Storefront-User";
pub const USER_SIGNATURE_HEADER: &str = "X-Storefront-User-Signature";

pub struct IdentityMiddlewareFactory {
    secret: Secret<String>,
}

impl IdentityMiddlewareFactory {
    pub fn new(secret: Secret<String>) -> Self {
        IdentityMiddlewareFactory { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = IdentityMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) }))
    }
}

pub struct IdentityMiddlewareService<S> {
    secret: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        match read_identity(&req, self.secret.reveal()) {
            Ok(Some(user)) => {
                trace!("🔐️ Request is from user #{}", user.0);
                req.extensions_mut().insert(user);
            },
            Ok(None) => trace!("🔐️ Anonymous request"),
            Err(e) => {
                warn!("🔐️ Rejecting request to {}. {e}", req.path());
                let res = req.error_response(ServerError::AuthenticationError(e)).map_into_right_body();
                return Box::pin(async move { Ok(res) });
            },
        }
        Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) })
    }
}

fn read_identity(req: &ServiceRequest, secret: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
    let Some(user) = req.headers().get(USER_HEADER) else {
        return Ok(None);
    };
    let user = user.to_str().map_err(|_| AuthError::MalformedIdentity)?.trim();
    let signature = req
        .headers()
        .get(USER_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidIdentity)?;
    if !verify_hmac(secret, user.as_bytes(), signature) {
        return Err(AuthError::InvalidIdentity);
    }
    let user_id = user.parse::<i64>().map_err(|_| AuthError::MalformedIdentity)?;
    Ok(Some(AuthenticatedUser(user_id)))
}
