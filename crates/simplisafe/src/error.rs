//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use simplisafe_config::ConfigError;
use simplisafe_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("SimpliSafe rejected the credentials for profile '{profile}'")]
    #[diagnostic(
        code(simplisafe::auth_failed),
        help(
            "{reason}\n\
             Update the password with: simplisafe config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, reason: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(simplisafe::no_credentials),
        help(
            "{reason}\n\
             Configure a profile with: simplisafe config init --username <email>\n\
             Or set SIMPLISAFE_USERNAME and SIMPLISAFE_PASSWORD."
        )
    )]
    NoCredentials { profile: String, reason: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Base station '{location}' not found")]
    #[diagnostic(
        code(simplisafe::not_found),
        help("Known base stations: {available}\nRun: simplisafe status")
    )]
    StationNotFound { location: String, available: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(simplisafe::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: simplisafe config init --profile {name} --username <email>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(simplisafe::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(simplisafe::config),
        help("Check the file printed by: simplisafe config path")
    )]
    Config { message: String },

    // ── Runtime ──────────────────────────────────────────────────────

    #[error("Could not reach SimpliSafe: {message}")]
    #[diagnostic(code(simplisafe::connection_failed))]
    ConnectionFailed { message: String },

    #[error("Timed out after {seconds}s waiting for {waiting_for}")]
    #[diagnostic(
        code(simplisafe::timeout),
        help("Increase the wait with --wait, or run with -vv to see vendor traffic.")
    )]
    Timeout { seconds: u64, waiting_for: String },

    #[error("Controller error: {0}")]
    #[diagnostic(code(simplisafe::controller))]
    Controller(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::StationNotFound { .. } => exit_code::NOT_FOUND,
            Self::ProfileNotFound { .. } | Self::Validation { .. } | Self::Config { .. } => {
                exit_code::CONFIG
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration { message } => CliError::Config { message },
            CoreError::Transport { message } => CliError::ConnectionFailed { message },
            other => CliError::Controller(other.to_string()),
        }
    }
}
