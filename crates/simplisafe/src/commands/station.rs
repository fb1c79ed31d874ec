//! `arm` / `disarm`: change a base station's mode and wait for the vendor
//! to confirm it.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use simplisafe_core::{ControllerHandle, HostEvent, StationInfo, Variable};

use crate::cli::StationArgs;
use crate::commands::util;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &StationArgs, armed: bool, ctx: &Resolved) -> Result<(), CliError> {
    let handle = util::start(ctx).await?;
    let result = set_and_confirm(&handle, args, armed, ctx).await;
    handle.shutdown().await;

    let station = result?;
    output::print_output(&output::render_stations(ctx.output, &[station])?);
    Ok(())
}

async fn set_and_confirm(
    handle: &ControllerHandle,
    args: &StationArgs,
    armed: bool,
    ctx: &Resolved,
) -> Result<StationInfo, CliError> {
    let wait = Duration::from_secs(args.wait.wait);
    let location = args.location.as_str();

    let found = util::wait_for_stations(
        handle,
        wait,
        &ctx.profile_name,
        "base station discovery",
        |stations| stations.contains_key(location),
    )
    .await;
    let station = match found {
        Ok(stations) => stations.get(location).cloned(),
        Err(CliError::Timeout { .. }) if !handle.stations().borrow().is_empty() => None,
        Err(e) => return Err(e),
    };
    let Some(station) = station else {
        return Err(CliError::StationNotFound {
            location: location.into(),
            available: util::known_ids(&handle.stations().borrow()),
        });
    };

    let mut events = handle.subscribe();
    info!(location, armed, "requesting state change");
    handle.set_armed(location, armed).await?;

    let confirm = async {
        loop {
            match events.recv().await {
                Ok(HostEvent::VariableChanged {
                    location: changed,
                    variable: Variable::Armed,
                    value,
                }) if changed == location && value == armed => return Ok(()),
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event stream lagged"),
                Err(RecvError::Closed) => {
                    return Err(CliError::Controller("controller stopped".into()));
                }
            }
        }
    };
    tokio::time::timeout(wait, confirm)
        .await
        .map_err(|_| CliError::Timeout {
            seconds: wait.as_secs(),
            waiting_for: format!("{location} to confirm the new state"),
        })??;

    Ok(StationInfo {
        armed: Some(armed),
        ..station
    })
}
