//! `run`: keep the bridge alive until interrupted.
//!
//! Host events stream to stdout in the selected format. SIGHUP re-reads the
//! config file and hands the controller the new credentials; SIGINT and
//! SIGTERM stop the bridge.

use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use simplisafe_core::ControllerHandle;

use crate::cli::GlobalOpts;
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts, ctx: &Resolved) -> Result<(), CliError> {
    let handle = ControllerHandle::spawn(&ctx.runtime)?;
    let mut events = handle.subscribe();
    handle.configure(ctx.configuration.clone()).await?;
    info!(
        profile = %ctx.profile_name,
        base_url = %ctx.runtime.base_url,
        refresh_secs = ctx.runtime.refresh_interval.as_secs(),
        "bridge running"
    );

    let mut hangup = Trigger::hangup()?;
    let mut terminate = Trigger::terminate()?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            result = &mut shutdown => {
                result?;
                info!("interrupt received; shutting down");
                break;
            }
            () = terminate.recv() => {
                info!("SIGTERM received; shutting down");
                break;
            }
            () = hangup.recv() => reload_configuration(&handle, global).await,
            event = events.recv() => match event {
                Ok(event) => output::print_output(&output::render_event(ctx.output, &event)?),
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn reload_configuration(handle: &ControllerHandle, global: &GlobalOpts) {
    info!("reloading configuration");
    let resolved = match config::resolve(global) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, "configuration reload failed; keeping current credentials");
            return;
        }
    };
    if let Err(e) = handle.configure(resolved.configuration).await {
        error!(error = %e, "could not deliver reloaded configuration");
    }
}

// ── Signals ──────────────────────────────────────────────────────────

/// One unix signal as an awaitable trigger; never fires elsewhere.
#[cfg(unix)]
struct Trigger(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Trigger {
    fn hangup() -> Result<Self, CliError> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self(signal(SignalKind::hangup())?))
    }

    fn terminate() -> Result<Self, CliError> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self(signal(SignalKind::terminate())?))
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct Trigger;

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
impl Trigger {
    fn hangup() -> Result<Self, CliError> {
        Ok(Self)
    }

    fn terminate() -> Result<Self, CliError> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}
