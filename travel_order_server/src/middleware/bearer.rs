//! Bearer-token middleware for the travel order server.
//! This middleware can be placed on any route or service.
//!
//! It checks the incoming request for a valid `Authorization: Bearer <token>` header, verifies
//! the token's signature and expiry, and places the decoded [`JwtClaims`] in the request
//! extensions, where handlers pick them up via the `JwtClaims` extractor. Requests without a
//! valid token are rejected with a 401 before they reach the handler.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::{
    auth::TokenIssuer,
    errors::{AuthError, ServerError},
};

pub struct BearerAuthFactory;

impl BearerAuthFactory {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuthFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthService { service: Rc::new(service) })
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let issuer = req.app_data::<web::Data<TokenIssuer>>().cloned().ok_or_else(|| {
                log::error!("🔐️ No TokenIssuer found in app data. This is a server wiring bug");
                Error::from(ServerError::Unspecified("Token issuer is not configured".to_string()))
            })?;
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or_else(|| Error::from(ServerError::AuthenticationError(AuthError::MissingToken)))?;
            let claims = issuer
                .validate_token(token)
                .map_err(|e| Error::from(ServerError::AuthenticationError(e)))?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
