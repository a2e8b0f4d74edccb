//! Session cookie handling

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::Response,
};
use std::convert::Infallible;
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "verbatim_session";

/// Session id from the request cookie, or a fresh one
#[derive(Debug, Clone, Copy)]
pub struct SessionId {
    pub id: Uuid,
    is_new: bool,
}

impl SessionId {
    /// Read the session id from request headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());

        match existing {
            Some(id) => Self { id, is_new: false },
            None => Self { id: Uuid::new_v4(), is_new: true },
        }
    }

    /// Set the cookie on `response` when the session was just created
    pub fn attach(self, mut response: Response) -> Response {
        if self.is_new {
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_reads_existing_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );

        let session = SessionId::from_headers(&headers);
        assert_eq!(session.id, id);

        let response = session.attach("ok".into_response());
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_new_session_sets_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("verbatim_session=garbage"));

        let session = SessionId::from_headers(&headers);
        let response = session.attach("ok".into_response());
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();

        assert!(cookie.starts_with(&format!("{}={}", SESSION_COOKIE, session.id)));
    }
}
