//! Checkout session cookie
//!
//! The session id is the only thing the browser holds; the draft and payment
//! info stay in the server-side transient store under that id.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use core_kernel::SessionId;

pub const SESSION_COOKIE: &str = "checkout_session";

/// Session of the current request, minted when the cookie is missing or garbled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: SessionId,
    pub is_new: bool,
}

impl CheckoutSession {
    /// `Set-Cookie` value that refreshes the session for `max_age`
    pub fn cookie(&self, max_age: Duration) -> String {
        format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.id,
            max_age.as_secs()
        )
    }
}

fn session_from_cookies(parts: &Parts) -> Option<SessionId> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim().parse::<SessionId>().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for CheckoutSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match session_from_cookies(parts) {
            Some(id) => CheckoutSession { id, is_new: false },
            None => CheckoutSession {
                id: SessionId::new(),
                is_new: true,
            },
        })
    }
}
