// ── Base station device ──
//
// One discovered security panel. It knows its location id and last armed
// flag, and reaches the vendor only through a `StationClient`.

use simplisafe_api::models::parse_body;
use simplisafe_api::{AlarmMode, StateResponse};
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::host::StationInfo;

/// Capability a station uses to talk to the vendor.
///
/// Implemented by the controller's request side; a station never sees
/// controller internals.
pub trait StationClient {
    fn request_state(&mut self, location: &str);
    fn request_state_change(&mut self, location: &str, mode: AlarmMode);
}

/// A SimpliSafe base station, identified by its vendor location id.
#[derive(Debug, Clone)]
pub struct BaseStation {
    id: String,
    armed: Option<bool>,
}

impl BaseStation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            armed: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        format!("SimpliSafe ({})", self.id)
    }

    /// Last known armed flag; `None` until the first state response.
    pub fn armed(&self) -> Option<bool> {
        self.armed
    }

    pub fn info(&self) -> StationInfo {
        StationInfo {
            id: self.id.clone(),
            name: self.name(),
            armed: self.armed,
        }
    }

    /// Ask the vendor for current state. The answer arrives asynchronously.
    pub fn refresh(&self, client: &mut dyn StationClient) {
        client.request_state(&self.id);
    }

    /// Arm (`away`) or disarm (`home`) this station.
    pub fn set_armed(&self, client: &mut dyn StationClient, armed: bool) {
        let mode = AlarmMode::for_armed(armed);
        debug!(location = %self.id, %mode, "requesting state change");
        client.request_state_change(&self.id, mode);
    }

    /// Apply a get-state or set-state body. Returns the new armed flag.
    ///
    /// A body without `response_code` leaves the stored flag untouched.
    pub fn on_state_response(&mut self, body: &str) -> Result<bool, CoreError> {
        trace!(location = %self.id, %body, "received state body");
        let state: StateResponse = parse_body(body)?;
        let code = state.response_code.ok_or_else(|| {
            CoreError::protocol(format!("no response_code in state response: {body}"))
        })?;
        Ok(self.apply_response_code(code))
    }

    /// Armed iff the code is the vendor's "away" code.
    pub fn apply_response_code(&mut self, code: i64) -> bool {
        let armed = code == AlarmMode::AWAY_CODE;
        self.armed = Some(armed);
        armed
    }
}
