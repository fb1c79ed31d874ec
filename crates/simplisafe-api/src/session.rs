// Authenticated session state
//
// A session is minted exactly once per successful login and then handed
// around read-only. The vendor authorizes follow-up calls by the `uid`
// path segment plus the cookies set on the login response.

use std::fmt;

use secrecy::SecretString;

/// A single `name=value` cookie captured from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// An authenticated SimpliSafe session.
///
/// Immutable once built. When the vendor invalidates it the whole value
/// is dropped and a new login produces a fresh one.
#[derive(Debug, Clone)]
pub struct Session {
    session_token: SecretString,
    user_id: String,
    cookies: Vec<Cookie>,
}

impl Session {
    pub fn new(session_token: SecretString, user_id: impl Into<String>, cookies: Vec<Cookie>) -> Self {
        Self {
            session_token,
            user_id: user_id.into(),
            cookies,
        }
    }

    /// The opaque session token returned by login.
    pub fn session_token(&self) -> &SecretString {
        &self.session_token
    }

    /// The vendor user id, used as a path segment on every session request.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Render the session cookies as a `Cookie` header value.
    ///
    /// Returns `None` when login set no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let header = self
            .cookies
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_joins_pairs() {
        let session = Session::new(
            SecretString::from("tok".to_string()),
            "42",
            vec![Cookie::new("PHPSESSID", "abc"), Cookie::new("ssid", "xyz")],
        );
        assert_eq!(session.cookie_header().as_deref(), Some("PHPSESSID=abc; ssid=xyz"));
        assert_eq!(session.user_id(), "42");
    }

    #[test]
    fn cookie_header_absent_without_cookies() {
        let session = Session::new(SecretString::from(String::new()), "42", Vec::new());
        assert!(session.cookie_header().is_none());
    }
}
