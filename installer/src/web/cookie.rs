//! Session identity cookie.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "install_wizard_session";

/// Session id carried by the request, or a freshly minted one (`minted == true`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub id: String,
    pub minted: bool,
}

impl SessionCookie {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match read_session_id(headers) {
            Some(id) => Self { id, minted: false },
            None => Self {
                id: Uuid::new_v4().to_string(),
                minted: true,
            },
        }
    }

    /// Attach `Set-Cookie` when the id was minted for this request.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if !self.minted {
            return;
        }
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict",
            SESSION_COOKIE, self.id
        );
        // A UUID always forms a valid header value.
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// First well-formed session cookie; anything that is not a UUID is ignored.
fn read_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .find_map(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}
