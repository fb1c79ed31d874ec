// Outbound vendor requests
//
// Every request is a form-encoded POST. `RequestKind` rides along with the
// request and comes back with its completion, so responses are routed by
// type rather than by parsing a context string.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::models::AlarmMode;
use crate::session::Session;

const DEVICE_NAME: &str = "SimpliSafe";
const CLIENT_VERSION: &str = "1200";

/// What an in-flight request is for. Returned with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// `generation` is the credential generation the login was sent with.
    Login { generation: u64 },
    Locations,
    GetState { location: String },
    SetState { location: String, mode: AlarmMode },
}

impl RequestKind {
    /// The location a state request targets, if any.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::GetState { location } | Self::SetState { location, .. } => Some(location),
            Self::Login { .. } | Self::Locations => None,
        }
    }

    pub fn is_login(&self) -> bool {
        matches!(self, Self::Login { .. })
    }
}

/// Renders the compact tag form used in logs (`gstate:<id>` etc.).
impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { generation } => write!(f, "login#{generation}"),
            Self::Locations => f.write_str("locations"),
            Self::GetState { location } => write!(f, "gstate:{location}"),
            Self::SetState { location, .. } => write!(f, "sstate:{location}"),
        }
    }
}

/// Credentials and device identity for a login request.
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a SecretString,
    pub device_uuid: Uuid,
    pub generation: u64,
}

/// A fully described vendor request, ready to execute.
#[derive(Clone)]
pub struct VendorRequest {
    pub kind: RequestKind,
    /// Path relative to the base URL, always starting with `/mobile/`.
    pub path: String,
    pub form: Vec<(&'static str, String)>,
    /// `Cookie` header carrying the session cookies, if any.
    pub cookie_header: Option<String>,
}

impl VendorRequest {
    /// `POST /mobile/login`
    pub fn login(form: &LoginForm<'_>) -> Self {
        Self {
            kind: RequestKind::Login {
                generation: form.generation,
            },
            path: "/mobile/login".into(),
            form: vec![
                ("name", form.username.to_owned()),
                ("pass", form.password.expose_secret().to_owned()),
                ("device_name", DEVICE_NAME.into()),
                ("device_uuid", form.device_uuid.to_string()),
                ("version", CLIENT_VERSION.into()),
                ("no_persist", "1".into()),
            ],
            cookie_header: None,
        }
    }

    /// `POST /mobile/{uid}/locations`
    pub fn locations(session: &Session) -> Self {
        Self {
            kind: RequestKind::Locations,
            path: format!("/mobile/{}/locations", session.user_id()),
            form: vec![("no_persist", "0".into())],
            cookie_header: session.cookie_header(),
        }
    }

    /// `POST /mobile/{uid}/sid/{location}/get-state`
    pub fn get_state(session: &Session, location: &str) -> Self {
        Self {
            kind: RequestKind::GetState {
                location: location.to_owned(),
            },
            path: format!("/mobile/{}/sid/{location}/get-state", session.user_id()),
            form: vec![("no_persist", "0".into())],
            cookie_header: session.cookie_header(),
        }
    }

    /// `POST /mobile/{uid}/sid/{location}/set-state`
    pub fn set_state(session: &Session, location: &str, mode: AlarmMode) -> Self {
        Self {
            kind: RequestKind::SetState {
                location: location.to_owned(),
                mode,
            },
            path: format!("/mobile/{}/sid/{location}/set-state", session.user_id()),
            form: vec![
                ("state", mode.as_str().into()),
                ("mobile", "1".into()),
                ("no_persist", "0".into()),
            ],
            cookie_header: session.cookie_header(),
        }
    }

    /// Look up a form field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

// The login form carries the password, so it never goes to the logs.
impl fmt::Debug for VendorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form: Vec<(&str, &str)> = self
            .form
            .iter()
            .map(|(k, v)| if *k == "pass" { (*k, "[REDACTED]") } else { (*k, v.as_str()) })
            .collect();
        f.debug_struct("VendorRequest")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("form", &form)
            .field("has_cookies", &self.cookie_header.is_some())
            .finish()
    }
}
