//! Anonymous cart sessions.
//!
//! Visitors who are not logged in get a random session token in a cookie the first time they touch their cart. The
//! token is what their cart lines are stored under. Authenticated requests are passed through untouched.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    cookie::{Cookie, SameSite},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};

use crate::{
    auth::{AuthenticatedUser, SessionToken},
    helpers::new_session_token,
};

const MAX_TOKEN_LENGTH: usize = 128;

pub struct SessionMiddlewareFactory {
    cookie_name: String,
    secure: bool,
}

impl SessionMiddlewareFactory {
    pub fn new(cookie_name: &str, secure: bool) -> Self {
        SessionMiddlewareFactory { cookie_name: cookie_name.to_string(), secure }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SessionMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            cookie_name: self.cookie_name.clone(),
            secure: self.secure,
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    cookie_name: String,
    secure: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        if req.extensions().contains::<AuthenticatedUser>() {
            return Box::pin(async move { service.call(req).await });
        }
        let existing = req.cookie(&self.cookie_name).map(|c| c.value().to_string()).filter(|t| is_valid_token(t));
        if let Some(token) = existing {
            trace!("🔐️ Using existing cart session");
            req.extensions_mut().insert(SessionToken(token));
            return Box::pin(async move { service.call(req).await });
        }
        let token = new_session_token();
        debug!("🔐️ Starting a new cart session");
        req.extensions_mut().insert(SessionToken(token.clone()));
        let cookie = Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish();
        Box::pin(async move {
            let mut res = service.call(req).await?;
            if let Err(e) = res.response_mut().add_cookie(&cookie) {
                warn!("🔐️ Could not set the cart session cookie. {e}");
            }
            Ok(res)
        })
    }
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LENGTH
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
