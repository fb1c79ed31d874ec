//! Session lifecycle and polling state machine for the SimpliSafe bridge.
//!
//! - **[`Controller`]**: Single-owner state machine. Driven one event at a
//!   time: configuration updates, periodic ticks, HTTP completions and
//!   variable writes. Decides between login, discovery and polling, and
//!   routes each completion by its [`RequestKind`](simplisafe_api::RequestKind).
//!
//! - **[`BaseStation`]**: Per-location armed flag. Talks to the vendor only
//!   through the [`StationClient`] capability.
//!
//! - **[`Transport`] / [`Host`]**: The seams to the outside world:
//!   fire-and-forget request delivery and device/status publication.
//!
//! - **[`runtime`]**: tokio actor that owns a `Controller`, feeds it ticks
//!   and HTTP completions over a channel, and exposes a [`ControllerHandle`].

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod runtime;
pub mod station;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Configuration, Credentials, RuntimeConfig, TlsVerification};
pub use controller::{Controller, ControllerState};
pub use error::CoreError;
pub use host::{Host, PluginStatus, StationInfo, Variable};
pub use runtime::{ControllerEvent, ControllerHandle, HostEvent};
pub use station::{BaseStation, StationClient};
pub use transport::Transport;
