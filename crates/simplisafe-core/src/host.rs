// ── Host platform seam ──
//
// What the controller tells the outside world: new devices, variable
// changes and overall plugin status.

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

/// Overall plugin status reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PluginStatus {
    NotConfigured(String),
    Running,
    Failed(String),
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured(reason) => write!(f, "not configured ({reason})"),
            Self::Running => f.write_str("running"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Device variables exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Armed,
}

/// Snapshot of a base station as published to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationInfo {
    pub id: String,
    pub name: String,
    pub armed: Option<bool>,
}

/// Receiver of everything the controller surfaces.
pub trait Host {
    /// A new base station was discovered.
    fn publish(&mut self, station: &StationInfo);

    /// A station variable was updated from a vendor response.
    fn variable_changed(&mut self, location: &str, variable: Variable, value: bool);

    fn report_status(&mut self, status: PluginStatus);
}
