//! Shared helpers for commands that drive the controller.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use simplisafe_core::{ControllerHandle, CoreError, PluginStatus, StationInfo};

use crate::config::Resolved;
use crate::error::CliError;

/// Spawn the controller and hand it the resolved credentials.
pub async fn start(ctx: &Resolved) -> Result<ControllerHandle, CliError> {
    let handle = ControllerHandle::spawn(&ctx.runtime)?;
    debug!(profile = %ctx.profile_name, base_url = %ctx.runtime.base_url, "controller started");
    handle.configure(ctx.configuration.clone()).await?;
    Ok(handle)
}

/// A terminal plugin status, as a CLI error.
fn status_failure(status: Option<&PluginStatus>, profile: &str) -> Option<CliError> {
    match status? {
        PluginStatus::Failed(reason) => Some(CliError::AuthFailed {
            profile: profile.into(),
            reason: reason.clone(),
        }),
        PluginStatus::NotConfigured(reason) => Some(CliError::NoCredentials {
            profile: profile.into(),
            reason: reason.clone(),
        }),
        PluginStatus::Running => None,
    }
}

/// Wait until the published stations satisfy `ready`.
///
/// Fails early when the plugin reports it is not configured or the
/// credentials were rejected.
pub async fn wait_for_stations(
    handle: &ControllerHandle,
    wait: Duration,
    profile: &str,
    waiting_for: &str,
    ready: impl Fn(&BTreeMap<String, StationInfo>) -> bool,
) -> Result<BTreeMap<String, StationInfo>, CliError> {
    let mut stations = handle.stations();
    let mut status = handle.status();

    let watch = async {
        loop {
            let failure = status_failure(status.borrow_and_update().as_ref(), profile);
            if let Some(err) = failure {
                return Err(err);
            }
            let current = stations.borrow_and_update().clone();
            if ready(&current) {
                return Ok(current);
            }
            tokio::select! {
                changed = stations.changed() => changed.map_err(|_| CoreError::Disconnected)?,
                changed = status.changed() => changed.map_err(|_| CoreError::Disconnected)?,
            }
        }
    };

    tokio::time::timeout(wait, watch)
        .await
        .map_err(|_| CliError::Timeout {
            seconds: wait.as_secs(),
            waiting_for: waiting_for.into(),
        })?
}

/// Comma-separated station ids for help text.
pub fn known_ids(stations: &BTreeMap<String, StationInfo>) -> String {
    if stations.is_empty() {
        "(none)".into()
    } else {
        stations.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_is_not_a_failure() {
        assert!(status_failure(None, "default").is_none());
        assert!(status_failure(Some(&PluginStatus::Running), "default").is_none());
        assert!(matches!(
            status_failure(Some(&PluginStatus::Failed("bad".into())), "default"),
            Some(CliError::AuthFailed { .. })
        ));
    }

    #[test]
    fn known_ids_joins_sorted_keys() {
        let mut stations = BTreeMap::new();
        for id in ["B2", "A1"] {
            stations.insert(
                id.to_string(),
                StationInfo {
                    id: id.into(),
                    name: format!("SimpliSafe ({id})"),
                    armed: None,
                },
            );
        }
        assert_eq!(known_ids(&stations), "A1, B2");
        assert_eq!(known_ids(&BTreeMap::new()), "(none)");
    }
}
