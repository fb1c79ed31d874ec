//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use simplisafe_core::{HostEvent, StationInfo};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct StationRow {
    #[tabled(rename = "LOCATION")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: &'static str,
}

impl From<&StationInfo> for StationRow {
    fn from(station: &StationInfo) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            state: armed_label(station.armed),
        }
    }
}

fn armed_label(armed: Option<bool>) -> &'static str {
    match armed {
        Some(true) => "armed",
        Some(false) => "disarmed",
        None => "unknown",
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render base stations in the chosen format.
pub fn render_stations(format: OutputFormat, stations: &[StationInfo]) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<StationRow> = stations.iter().map(StationRow::from).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(stations)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(stations)?),
        OutputFormat::Plain => Ok(stations
            .iter()
            .map(|s| format!("{} {}", s.id, armed_label(s.armed)))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render one host event as a single line (JSON formats stay one line so the
/// stream is valid JSON Lines).
pub fn render_event(format: OutputFormat, event: &HostEvent) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => Ok(serde_json::to_string(event)?),
        OutputFormat::Table | OutputFormat::Plain => Ok(match event {
            HostEvent::Published(station) => format!("discovered {} ({})", station.id, station.name),
            HostEvent::VariableChanged {
                location,
                variable,
                value,
            } => format!("{location} {variable}={value}"),
            HostEvent::Status(status) => format!("status {status}"),
        }),
    }
}

/// Print rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use simplisafe_core::{PluginStatus, Variable};

    use super::*;

    fn stations() -> Vec<StationInfo> {
        vec![
            StationInfo {
                id: "A1".into(),
                name: "SimpliSafe (A1)".into(),
                armed: Some(true),
            },
            StationInfo {
                id: "B2".into(),
                name: "SimpliSafe (B2)".into(),
                armed: None,
            },
        ]
    }

    #[test]
    fn plain_lists_one_station_per_line() {
        let out = render_stations(OutputFormat::Plain, &stations()).unwrap();
        assert_eq!(out, "A1 armed\nB2 unknown");
    }

    #[test]
    fn table_has_headers_and_states() {
        let out = render_stations(OutputFormat::Table, &stations()).unwrap();
        assert!(out.contains("LOCATION"));
        assert!(out.contains("SimpliSafe (A1)"));
        assert!(out.contains("unknown"));
    }

    #[test]
    fn json_keeps_null_armed() {
        let out = render_stations(OutputFormat::JsonCompact, &stations()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["armed"], true);
        assert!(value[1]["armed"].is_null());
    }

    #[test]
    fn events_render_as_lines() {
        let changed = HostEvent::VariableChanged {
            location: "A1".into(),
            variable: Variable::Armed,
            value: false,
        };
        assert_eq!(
            render_event(OutputFormat::Plain, &changed).unwrap(),
            "A1 armed=false"
        );

        let status = render_event(OutputFormat::Json, &HostEvent::Status(PluginStatus::Running))
            .unwrap();
        assert!(!status.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(value["event"], "status");
    }
}
