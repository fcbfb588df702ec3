//! Authentication middleware.
//!
//! Reads the access token from the `candb_access_token` header (or an `Authorization: Bearer` header), validates it
//! and stores the claims in the request extensions. Requests without a valid token are rejected with 401.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;

use crate::{
    auth::{TokenValidator, ACCESS_TOKEN_HEADER},
    errors::{AuthError, ServerError},
};

pub struct AuthenticationMiddlewareFactory {
    validator: Rc<TokenValidator>,
}

impl AuthenticationMiddlewareFactory {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator: Rc::new(validator) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AuthenticationMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddlewareService { validator: Rc::clone(&self.validator), service: Rc::new(service) })
    }
}

pub struct AuthenticationMiddlewareService<S> {
    validator: Rc<TokenValidator>,
    service: Rc<S>,
}

fn access_token(req: &ServiceRequest) -> Option<String> {
    let headers = req.headers();
    if let Some(token) = headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token.trim().to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = Rc::clone(&self.validator);
        Box::pin(async move {
            let Some(token) = access_token(&req) else {
                trace!("💻️ No access token on request to {}", req.path());
                return Err(ServerError::AuthenticationError(AuthError::MissingToken).into());
            };
            let claims = validator.validate(&token).map_err(ServerError::AuthenticationError)?;
            trace!("💻️ Request to {} authenticated as {}", req.path(), claims.username);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
