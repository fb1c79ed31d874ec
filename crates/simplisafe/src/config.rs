//! CLI configuration: thin wrapper around `simplisafe_config`.
//!
//! Applies `GlobalOpts` overrides (--username, --base-url, --timeout) on top
//! of the resolved profile.

use clap::ValueEnum;

use simplisafe_config::{Config, Profile};
use simplisafe_core::{Configuration, RuntimeConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use simplisafe_config::{config_path, load_config};

/// Everything a command needs to start the controller.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub runtime: RuntimeConfig,
    pub configuration: Configuration,
    pub output: OutputFormat,
}

/// Load the config file and resolve the active profile with flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    resolve_from(&cfg, global)
}

pub fn resolve_from(cfg: &Config, global: &GlobalOpts) -> Result<Resolved, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());
    let profile = apply_overrides(cfg.profile(&profile_name)?, global);

    let runtime = simplisafe_config::profile_to_runtime_config(&profile, &cfg.defaults)?;
    let configuration = simplisafe_config::profile_to_configuration(&profile, &profile_name);
    let output = output_format(cfg, global)?;

    Ok(Resolved {
        profile_name,
        runtime,
        configuration,
        output,
    })
}

/// Output format: flag, then `defaults.output`.
pub fn output_format(cfg: &Config, global: &GlobalOpts) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    OutputFormat::from_str(&cfg.defaults.output, true).map_err(|_| CliError::Validation {
        field: "defaults.output".into(),
        reason: format!(
            "expected 'table', 'json', 'json-compact' or 'plain', got '{}'",
            cfg.defaults.output
        ),
    })
}

fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref base_url) = global.base_url {
        profile.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["simplisafe"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                username: Some("profile-user".into()),
                base_url: Some("https://example.invalid".into()),
                timeout: Some(10),
                ..Profile::default()
            },
        );

        let resolved = resolve_from(
            &cfg,
            &global(&[
                "--username",
                "flag-user",
                "--base-url",
                "http://127.0.0.1:9000",
                "--timeout",
                "3",
            ]),
        )
        .unwrap();

        assert_eq!(resolved.profile_name, "default");
        assert_eq!(resolved.configuration.username.as_deref(), Some("flag-user"));
        assert_eq!(resolved.runtime.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(resolved.runtime.timeout, Duration::from_secs(3));
        assert_eq!(resolved.output, OutputFormat::Table);
    }

    #[test]
    fn output_falls_back_to_defaults() {
        let mut cfg = Config::default();
        cfg.defaults.output = "json-compact".into();
        assert_eq!(
            output_format(&cfg, &global(&[])).unwrap(),
            OutputFormat::JsonCompact
        );
        assert_eq!(
            output_format(&cfg, &global(&["-o", "plain"])).unwrap(),
            OutputFormat::Plain
        );

        cfg.defaults.output = "yaml".into();
        assert!(output_format(&cfg, &global(&[])).is_err());
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        let err = resolve_from(&cfg, &global(&["--profile", "cabin"])).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { .. }));
    }
}
