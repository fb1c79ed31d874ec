//! Config subcommand handlers.

use std::io::BufRead;
use std::path::Path;

use simplisafe_config::{Config, Profile, save_config_to, store_password};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{config_path, load_config};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string());
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = load_config()?;
            output::print_output(&toml::to_string_pretty(&redacted(&cfg))?);
            Ok(())
        }
        ConfigCommand::Init {
            username,
            base_url,
            force,
        } => {
            let cfg = load_config()?;
            let name = cfg.active_profile_name(global.profile.as_deref());
            let path = config_path();
            init_profile(cfg, &name, username, base_url.as_deref(), *force, &path)?;
            output::print_output(&format!("profile '{name}' written to {}", path.display()));
            Ok(())
        }
        ConfigCommand::SetPassword => {
            let cfg = load_config()?;
            let name = cfg.active_profile_name(global.profile.as_deref());
            let password = read_password(std::io::stdin().lock())?;
            store_password(&name, &password)?;
            output::print_output(&format!("password stored in keyring for profile '{name}'"));
            Ok(())
        }
    }
}

/// Copy of `cfg` with every plaintext password masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    cfg
}

fn init_profile(
    mut cfg: Config,
    name: &str,
    username: &str,
    base_url: Option<&str>,
    force: bool,
    path: &Path,
) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "profile".into(),
            reason: format!("'{name}' already exists; pass --force to replace it"),
        });
    }
    if username.trim().is_empty() {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "must not be empty".into(),
        });
    }

    cfg.profiles.insert(
        name.to_owned(),
        Profile {
            username: Some(username.to_owned()),
            base_url: base_url.map(str::to_owned),
            ..Profile::default()
        },
    );
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.to_owned());
    }
    save_config_to(&cfg, path)?;
    Ok(())
}

/// First line of `input`, without the line terminator.
fn read_password(mut input: impl BufRead) -> Result<String, CliError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "no password on stdin".into(),
        });
    }
    Ok(password.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                username: Some("bob".into()),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let text = toml::to_string_pretty(&redacted(&cfg)).unwrap();
        assert!(text.contains(MASK));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("bob"));
    }

    #[test]
    fn init_writes_profile_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_profile(Config::default(), "home", "bob", None, false, &path).unwrap();
        let cfg = simplisafe_config::load_config_from(&path).unwrap();
        assert_eq!(cfg.profiles["home"].username.as_deref(), Some("bob"));

        let again = init_profile(cfg.clone(), "home", "alice", None, false, &path);
        assert!(matches!(again, Err(CliError::Validation { .. })));

        init_profile(cfg, "home", "alice", Some("http://127.0.0.1:9"), true, &path).unwrap();
        let cfg = simplisafe_config::load_config_from(&path).unwrap();
        assert_eq!(cfg.profiles["home"].username.as_deref(), Some("alice"));
        assert_eq!(
            cfg.profiles["home"].base_url.as_deref(),
            Some("http://127.0.0.1:9")
        );
    }

    #[test]
    fn password_is_first_line() {
        assert_eq!(read_password("s3cret\r\nignored\n".as_bytes()).unwrap(), "s3cret");
        assert!(read_password("".as_bytes()).is_err());
        assert!(read_password("\n".as_bytes()).is_err());
    }
}
