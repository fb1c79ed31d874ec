// ── Runtime configuration ──
//
// These types describe *what* the bridge logs in with and *how* it reaches
// the vendor. They never touch disk: the CLI resolves a profile and hands
// the result in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// A configuration update from the host: either field may be absent.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Configuration {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
        }
    }

    /// An update that clears both credentials.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Resolve into a complete credential pair.
    ///
    /// Both absent is `Ok(None)`; exactly one absent is a configuration
    /// error. Empty strings count as absent.
    pub fn credentials(&self) -> Result<Option<Credentials>, CoreError> {
        let username = self.username.as_deref().filter(|u| !u.is_empty());
        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Credentials {
                username: username.to_owned(),
                password: password.clone(),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(CoreError::Configuration {
                message: "password not configured".into(),
            }),
            (None, Some(_)) => Err(CoreError::Configuration {
                message: "username not configured".into(),
            }),
        }
    }
}

/// A complete username/password pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// Whether both fields match `other`.
    pub fn same_as(&self, other: &Credentials) -> bool {
        self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled web PKI roots.
    #[default]
    SystemDefaults,
    /// Additionally trust a CA certificate file.
    CustomCa(PathBuf),
}

/// Connection and scheduling settings for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Vendor base URL (e.g. `https://simplisafe.com`).
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How often the controller ticks.
    pub refresh_interval: Duration,
}

impl RuntimeConfig {
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn complete_pair_resolves() {
        let creds = Configuration::new("bob", "pw").credentials().unwrap().unwrap();
        assert_eq!(creds.username, "bob");
        assert!(creds.same_as(&Configuration::new("bob", "pw").credentials().unwrap().unwrap()));
    }

    #[test]
    fn either_field_change_is_a_difference() {
        let base = Configuration::new("bob", "pw").credentials().unwrap().unwrap();
        let new_user = Configuration::new("alice", "pw").credentials().unwrap().unwrap();
        let new_pass = Configuration::new("bob", "pw2").credentials().unwrap().unwrap();
        assert!(!base.same_as(&new_user));
        assert!(!base.same_as(&new_pass));
    }

    #[test]
    fn absent_and_partial_pairs() {
        assert!(Configuration::unconfigured().credentials().unwrap().is_none());

        let partial = Configuration {
            username: Some("bob".into()),
            password: None,
        };
        assert!(matches!(
            partial.credentials(),
            Err(CoreError::Configuration { .. })
        ));

        let empty = Configuration::new("", "");
        assert!(empty.credentials().unwrap().is_none());
    }
}
