//! Configuration for the SimpliSafe bridge.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation into `simplisafe_core::{RuntimeConfig, Configuration}`. The
//! binary layers its command-line overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use simplisafe_core::{Configuration, RuntimeConfig, TlsVerification};

const KEYRING_SERVICE: &str = "simplisafe";
pub const ENV_PREFIX: &str = "SIMPLISAFE_";
pub const USERNAME_ENV: &str = "SIMPLISAFE_USERNAME";
pub const PASSWORD_ENV: &str = "SIMPLISAFE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String, available: Vec<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named SimpliSafe accounts.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between controller ticks.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_interval() -> u64 {
    RuntimeConfig::DEFAULT_REFRESH_INTERVAL.as_secs()
}

/// A named SimpliSafe account.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Vendor base URL; defaults to the public SimpliSafe endpoint.
    pub base_url: Option<String>,

    pub username: Option<String>,

    /// Plaintext password (prefer keyring or `SIMPLISAFE_PASSWORD`).
    pub password: Option<String>,

    /// Additional CA certificate to trust.
    pub ca_cert: Option<PathBuf>,

    /// Override the default timeout.
    pub timeout: Option<u64>,

    /// Override the default refresh interval.
    pub refresh_interval: Option<u64>,
}

impl Config {
    /// The profile name in effect when `requested` is not given.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile by name.
    ///
    /// The default profile may be absent from the file, in which case an
    /// empty profile is returned and everything comes from env and flags.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        if let Some(profile) = self.profiles.get(name) {
            return Ok(profile.clone());
        }
        if self.default_profile.as_deref().unwrap_or("default") == name {
            debug!(profile = name, "default profile not in config file; using empty profile");
            return Ok(Profile::default());
        }
        let mut available: Vec<String> = self.profiles.keys().cloned().collect();
        available.sort();
        Err(ConfigError::UnknownProfile {
            name: name.into(),
            available,
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "simplisafe-bridge", "simplisafe").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("simplisafe");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// A missing file is not an error. Nested keys in the environment use a
/// double underscore: `SIMPLISAFE_PROFILES__HOME__USERNAME`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "configuration loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Username: profile value, then `SIMPLISAFE_USERNAME`.
pub fn resolve_username(profile: &Profile) -> Option<String> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
}

/// Password: `SIMPLISAFE_PASSWORD`, then the system keyring, then the
/// plaintext profile value.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    profile.password.clone().map(SecretString::from)
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// The credential update for the controller. Either half may be absent;
/// the controller decides what a partial pair means.
pub fn profile_to_configuration(profile: &Profile, profile_name: &str) -> Configuration {
    Configuration {
        username: resolve_username(profile),
        password: resolve_password(profile, profile_name),
    }
}

/// Build a `RuntimeConfig` from a profile and the global defaults.
pub fn profile_to_runtime_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<RuntimeConfig, ConfigError> {
    let url_str = profile
        .base_url
        .as_deref()
        .unwrap_or(simplisafe_api::DEFAULT_BASE_URL);
    let base_url: url::Url = url_str.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let refresh = profile.refresh_interval.unwrap_or(defaults.refresh_interval);
    if refresh == 0 {
        return Err(ConfigError::Validation {
            field: "refresh_interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa);

    let mut config = RuntimeConfig::new(base_url);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.refresh_interval = Duration::from_secs(refresh);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.refresh_interval, 10);
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_from_toml() {
        let (_dir, path) = write_config(
            r#"
default_profile = "home"

[defaults]
refresh_interval = 20

[profiles.home]
username = "bob@example.com"
password = "hunter2"
timeout = 5
"#,
        );
        let cfg = load_config_from(&path).unwrap();
        let name = cfg.active_profile_name(None);
        assert_eq!(name, "home");

        let profile = cfg.profile(&name).unwrap();
        assert_eq!(profile.username.as_deref(), Some("bob@example.com"));

        let runtime = profile_to_runtime_config(&profile, &cfg.defaults).unwrap();
        assert_eq!(runtime.base_url.as_str(), "https://simplisafe.com/");
        assert_eq!(runtime.timeout, Duration::from_secs(5));
        assert_eq!(runtime.refresh_interval, Duration::from_secs(20));
        assert_eq!(runtime.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn requested_profile_wins() {
        let cfg = Config::default();
        assert_eq!(cfg.active_profile_name(Some("cabin")), "cabin");
        assert_eq!(cfg.active_profile_name(None), "default");
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), Profile::default());

        assert!(cfg.profile("default").is_ok());
        match cfg.profile("cabin") {
            Err(ConfigError::UnknownProfile { name, available }) => {
                assert_eq!(name, "cabin");
                assert_eq!(available, vec!["home".to_string()]);
            }
            other => panic!("expected UnknownProfile, got {other:?}"),
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let profile = Profile {
            base_url: Some("not a url".into()),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_runtime_config(&profile, &Defaults::default()),
            Err(ConfigError::Validation { field, .. }) if field == "base_url"
        ));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let profile = Profile {
            refresh_interval: Some(0),
            ..Profile::default()
        };
        assert!(profile_to_runtime_config(&profile, &Defaults::default()).is_err());
    }

    #[test]
    fn ca_cert_selects_custom_tls() {
        let profile = Profile {
            base_url: Some("http://127.0.0.1:8080".into()),
            ca_cert: Some(PathBuf::from("/etc/ssl/vendor.pem")),
            ..Profile::default()
        };
        let runtime = profile_to_runtime_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(
            runtime.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/vendor.pem"))
        );
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        // Unique profile name so no keyring entry can exist for it.
        let profile = Profile {
            username: Some("bob".into()),
            password: Some("hunter2".into()),
            ..Profile::default()
        };
        let configuration = profile_to_configuration(&profile, "plaintext-test-profile");

        assert_eq!(configuration.username.as_deref(), Some("bob"));
        if std::env::var(PASSWORD_ENV).is_err() {
            assert_eq!(
                configuration.password.unwrap().expose_secret(),
                "hunter2"
            );
        }
    }

    #[test]
    fn saved_config_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                username: Some("bob".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].username.as_deref(), Some("bob"));
    }
}
