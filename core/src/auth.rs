//! Credential attachment strategies.
//!
//! The client owns exactly one strategy and runs every outbound request
//! through it just before handing the request to the transport. Builders
//! never see credentials.

use std::fmt;

use crate::http::HttpRequest;

/// Attaches credentials to an outbound request.
pub trait Authorization: fmt::Debug + Send + Sync {
    fn attach(&self, request: HttpRequest) -> HttpRequest;
}

/// OAuth2 access token sent as `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct TokenAuthorization {
    token: String,
}

impl TokenAuthorization {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for TokenAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthorization")
            .field("token", &"***REDACTED***")
            .finish()
    }
}

impl Authorization for TokenAuthorization {
    fn attach(&self, mut request: HttpRequest) -> HttpRequest {
        request
            .headers
            .push(("authorization".to_string(), format!("Bearer {}", self.token)));
        request
    }
}

/// Access token sent as an `access_token` query parameter.
#[derive(Clone)]
pub struct QueryTokenAuthorization {
    token: String,
}

impl QueryTokenAuthorization {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for QueryTokenAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryTokenAuthorization")
            .field("token", &"***REDACTED***")
            .finish()
    }
}

impl Authorization for QueryTokenAuthorization {
    fn attach(&self, mut request: HttpRequest) -> HttpRequest {
        let pair = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("access_token", &self.token)
            .finish();
        let separator = if request.url.contains('?') { '&' } else { '?' };
        request.url = format!("{}{separator}{pair}", request.url);
        request
    }
}
