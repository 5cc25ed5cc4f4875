use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::{middleware::bearer_token, AuthKeys, CustomerClaims};
use crate::Error;

/// Signed-in customer, verified against the identity provider
/// Usage in handlers: `async fn handler(Customer(claims): Customer) -> ...`
pub struct Customer(pub CustomerClaims);

/// Like [`Customer`] but lets anonymous requests through. A token that is present but
/// invalid is still rejected.
pub struct OptionalCustomer(pub Option<CustomerClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for Customer
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(Error::Unauthorized)?;
        Arc::<AuthKeys>::from_ref(state).verify_customer(token).map(Customer)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalCustomer
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            None => Ok(OptionalCustomer(None)),
            Some(token) => Arc::<AuthKeys>::from_ref(state).verify_customer(token).map(|c| OptionalCustomer(Some(c))),
        }
    }
}
