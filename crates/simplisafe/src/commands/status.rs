//! `status`: print every base station once all have reported state.

use std::time::Duration;

use crate::cli::WaitArgs;
use crate::commands::util;
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &WaitArgs, ctx: &Resolved) -> Result<(), CliError> {
    let handle = util::start(ctx).await?;
    let result = util::wait_for_stations(
        &handle,
        Duration::from_secs(args.wait),
        &ctx.profile_name,
        "base station state",
        |stations| !stations.is_empty() && stations.values().all(|s| s.armed.is_some()),
    )
    .await;
    handle.shutdown().await;

    let stations: Vec<_> = result?.into_values().collect();
    output::print_output(&output::render_stations(ctx.output, &stations)?);
    Ok(())
}
