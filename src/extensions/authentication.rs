//! Authorization header helpers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::http::Request;
use crate::http::headers::AUTHORIZATION;

/// A request about to receive credentials.
///
/// Obtained with [`Request::authentication`].
#[derive(Debug)]
pub struct AuthenticatedRequest {
    request: Request,
}

impl AuthenticatedRequest {
    /// `Authorization: Basic base64(username:password)`
    pub fn basic(self, username: &str, password: &str) -> Request {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        self.request.header(AUTHORIZATION, format!("Basic {encoded}"))
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(self, token: &str) -> Request {
        self.request.header(AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Give the request back without credentials.
    pub fn into_inner(self) -> Request {
        self.request
    }
}

impl Request {
    pub fn authentication(self) -> AuthenticatedRequest {
        AuthenticatedRequest { request: self }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{manager_with, respond_with};

    #[test]
    fn basic_credentials_are_base64_encoded() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .get("https://example.com")
            .unwrap()
            .authentication()
            .basic("username", "password");
        assert_eq!(
            request.headers().get("authorization"),
            ["Basic dXNlcm5hbWU6cGFzc3dvcmQ="]
        );
    }

    #[test]
    fn bearer_replaces_previous_credentials() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .get("https://example.com")
            .unwrap()
            .authentication()
            .basic("a", "b")
            .authentication()
            .bearer("token");
        assert_eq!(request.headers().get("Authorization"), ["Bearer token"]);
    }
}
