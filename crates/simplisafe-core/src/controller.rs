// ── Controller state machine ──
//
// Owns credentials, the current session and the base station registry.
// Every entry point runs to completion before the next one starts, so
// nothing here needs a lock. Requests go out through the `Transport` and
// their completions come back through `on_http_response` / `on_http_failure`
// tagged with the `RequestKind` they were issued with.

use std::collections::HashMap;

use secrecy::SecretString;
use simplisafe_api::models::{LOGIN_INVALID_CREDENTIALS, LOGIN_SUCCESS, parse_body};
use simplisafe_api::{
    AlarmMode, Cookie, HttpResponse, LocationsResponse, LoginForm, LoginResponse, RequestKind,
    Session, VendorRequest,
};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::config::{Configuration, Credentials};
use crate::error::CoreError;
use crate::host::{Host, PluginStatus, Variable};
use crate::station::{BaseStation, StationClient};
use crate::transport::Transport;

const NOT_CONFIGURED_REASON: &str = "Username and password not configured";
const INVALID_CREDENTIALS_REASON: &str = "Username and/or password are invalid";

/// Where the controller is in its lifecycle. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No credentials.
    NotConfigured,
    /// Credentials but no session.
    NeedsLogin,
    /// Session but no base stations yet.
    NeedsDiscovery,
    /// Session and at least one base station.
    Polling,
}

/// The request side of the controller: transport plus the session that
/// authorizes requests. Split out so stations can borrow it while the
/// registry is being iterated.
struct Link<T> {
    transport: T,
    session: Option<Session>,
    device_uuid: Uuid,
}

impl<T: Transport> StationClient for Link<T> {
    fn request_state(&mut self, location: &str) {
        let Some(session) = &self.session else {
            error!(location, "no login session; unable to perform state query");
            return;
        };
        trace!(location, "performing get state");
        self.transport
            .send(VendorRequest::get_state(session, location));
    }

    fn request_state_change(&mut self, location: &str, mode: AlarmMode) {
        let Some(session) = &self.session else {
            error!(location, %mode, "no login session; unable to set state");
            return;
        };
        debug!(location, %mode, "performing set state");
        self.transport
            .send(VendorRequest::set_state(session, location, mode));
    }
}

/// The SimpliSafe plugin orchestrator.
pub struct Controller<T: Transport, H: Host> {
    credentials: Option<Credentials>,
    /// Bumped whenever the credential pair changes. Login replies sent under
    /// an older generation are dropped.
    generation: u64,
    link: Link<T>,
    stations: HashMap<String, BaseStation>,
    host: H,
    status: Option<PluginStatus>,
}

impl<T: Transport, H: Host> Controller<T, H> {
    /// Create an unconfigured controller. A device UUID is generated here
    /// and reused for every login for the life of the process.
    pub fn new(transport: T, host: H) -> Self {
        Self {
            credentials: None,
            generation: 0,
            link: Link {
                transport,
                session: None,
                device_uuid: Uuid::new_v4(),
            },
            stations: HashMap::new(),
            host,
            status: None,
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        match (
            self.credentials.is_some(),
            self.link.session.is_some(),
            self.stations.is_empty(),
        ) {
            (_, true, true) => ControllerState::NeedsDiscovery,
            (_, true, false) => ControllerState::Polling,
            (true, false, _) => ControllerState::NeedsLogin,
            (false, false, _) => ControllerState::NotConfigured,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.link.session.as_ref()
    }

    pub fn station(&self, location: &str) -> Option<&BaseStation> {
        self.stations.get(location)
    }

    pub fn stations(&self) -> impl Iterator<Item = &BaseStation> {
        self.stations.values()
    }

    pub fn status(&self) -> Option<&PluginStatus> {
        self.status.as_ref()
    }

    pub fn device_uuid(&self) -> Uuid {
        self.link.device_uuid
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn transport(&self) -> &T {
        &self.link.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.link.transport
    }

    // ── Host entry points ────────────────────────────────────────

    /// Apply the configuration present at startup.
    pub fn on_startup(&mut self, config: &Configuration) {
        debug!("SimpliSafe plugin is starting");
        self.on_configuration_update(config);
    }

    /// Apply a configuration update.
    ///
    /// A complete pair that differs from the held one in either field drops
    /// the session and forces a tick. Absent or partial credentials leave
    /// the plugin not configured.
    pub fn on_configuration_update(&mut self, config: &Configuration) {
        match config.credentials() {
            Ok(Some(credentials)) => {
                if self
                    .credentials
                    .as_ref()
                    .is_some_and(|held| held.same_as(&credentials))
                {
                    debug!("credentials unchanged");
                    return;
                }
                debug!(username = %credentials.username, "username and password have changed");
                self.replace_credentials(Some(credentials));
                self.on_tick();
            }
            Ok(None) => {
                self.replace_credentials(None);
                self.set_status(PluginStatus::NotConfigured(NOT_CONFIGURED_REASON.into()));
            }
            Err(e) => {
                warn!(error = %e, "incomplete credentials");
                self.replace_credentials(None);
                self.set_status(PluginStatus::NotConfigured(e.to_string()));
            }
        }
    }

    /// Periodic tick: perform exactly one step of the lifecycle.
    pub fn on_tick(&mut self) {
        match self.state() {
            ControllerState::NotConfigured => {
                if !matches!(
                    self.status,
                    Some(PluginStatus::NotConfigured(_) | PluginStatus::Failed(_))
                ) {
                    self.set_status(PluginStatus::NotConfigured(NOT_CONFIGURED_REASON.into()));
                }
            }
            ControllerState::NeedsLogin => self.perform_login(),
            ControllerState::NeedsDiscovery => self.perform_locations(),
            ControllerState::Polling => {
                for station in self.stations.values() {
                    station.refresh(&mut self.link);
                }
            }
        }
    }

    /// Route a completed HTTP exchange by the kind it was issued with.
    pub fn on_http_response(&mut self, kind: &RequestKind, response: &HttpResponse) {
        trace!(%kind, status = response.status, "received HTTP response");
        if let Err(e) = self.dispatch(kind, response) {
            match e {
                CoreError::Protocol { .. } => {
                    error!(%kind, status = response.status, error = %e, "ignoring response");
                }
                _ => error!(%kind, error = %e, "error processing HTTP response"),
            }
        }
    }

    /// A request never completed. Nothing advanced, so the next tick
    /// retries the same step.
    pub fn on_http_failure(&mut self, kind: &RequestKind, cause: &CoreError) {
        error!(%kind, error = %cause, "request failure");
    }

    /// A host-side write to a station variable.
    pub fn on_set_variable(&mut self, location: &str, variable: Variable, value: bool) {
        debug!(location, %variable, value, "variable set requested");
        match variable {
            Variable::Armed => {
                let Some(station) = self.stations.get(location) else {
                    warn!(location, "set requested for unknown base station");
                    return;
                };
                station.set_armed(&mut self.link, value);
            }
        }
    }

    // ── Response handling ────────────────────────────────────────

    fn dispatch(&mut self, kind: &RequestKind, response: &HttpResponse) -> Result<(), CoreError> {
        if matches!(kind, RequestKind::Login { generation } if *generation != self.generation) {
            debug!(%kind, current = self.generation, "dropping reply to a login sent with older credentials");
            return Ok(());
        }

        if response.is_unauthorized() {
            if kind.is_login() {
                self.invalidate_credentials();
            } else if self.link.session.take().is_some() {
                warn!(%kind, error = %CoreError::SessionExpired, "detected invalid session; will login again");
                self.on_tick();
            } else {
                debug!(%kind, "session already discarded; ignoring stale 401");
            }
            return Ok(());
        }

        if !response.is_success() {
            return Err(CoreError::protocol(format!(
                "unexpected status code {}",
                response.status
            )));
        }

        match kind {
            RequestKind::Login { .. } => self.process_login(&response.cookies, &response.body),
            RequestKind::Locations => self.process_locations(&response.body),
            RequestKind::GetState { location } => self.process_state(location, &response.body),
            RequestKind::SetState { location, mode } => {
                trace!(location, %mode, "received set state response");
                self.process_state(location, &response.body)
            }
        }
    }

    fn process_login(&mut self, cookies: &[Cookie], body: &str) -> Result<(), CoreError> {
        let login: LoginResponse = parse_body(body)?;
        match login.return_code {
            Some(LOGIN_SUCCESS) => {
                let token = login
                    .session
                    .ok_or_else(|| CoreError::protocol("no session in login response"))?;
                let uid = login
                    .uid
                    .ok_or_else(|| CoreError::protocol("no uid in login response"))?;

                self.link.session = Some(Session::new(
                    SecretString::from(token),
                    uid,
                    cookies.to_vec(),
                ));
                info!(
                    username = login.username.as_deref().unwrap_or_default(),
                    "received a successful login"
                );
                self.set_status(PluginStatus::Running);
                self.on_tick();
                Ok(())
            }
            Some(LOGIN_INVALID_CREDENTIALS) => {
                self.invalidate_credentials();
                Ok(())
            }
            Some(code) => Err(CoreError::protocol(format!(
                "unexpected login return_code: {code}"
            ))),
            None => Err(CoreError::protocol("no return_code found in login response")),
        }
    }

    fn process_locations(&mut self, body: &str) -> Result<(), CoreError> {
        let locations: LocationsResponse = parse_body(body)?;
        if locations.locations.is_none() {
            return Err(CoreError::protocol("no locations in locations response"));
        }

        for location in locations.location_ids() {
            if self.stations.contains_key(location) {
                continue;
            }
            debug!(location, "publishing base station");
            let station = BaseStation::new(location);
            self.host.publish(&station.info());
            self.stations.insert(location.to_owned(), station);
        }

        // No extra tick here: an account without stations would loop on locations.
        if self.stations.is_empty() {
            warn!("account has no base stations; will query again on next tick");
            return Ok(());
        }
        self.on_tick();
        Ok(())
    }

    fn process_state(&mut self, location: &str, body: &str) -> Result<(), CoreError> {
        let Some(station) = self.stations.get_mut(location) else {
            error!(location, "received state for unknown base station");
            return Ok(());
        };
        let armed = station.on_state_response(body)?;
        debug!(location, armed, "base station state updated");
        self.host.variable_changed(location, Variable::Armed, armed);
        Ok(())
    }

    // ── Requests ─────────────────────────────────────────────────

    fn perform_login(&mut self) {
        let Some(credentials) = &self.credentials else {
            error!("missing username and password; unable to login");
            return;
        };
        debug!(username = %credentials.username, "sending login request");
        let request = VendorRequest::login(&LoginForm {
            username: &credentials.username,
            password: &credentials.password,
            device_uuid: self.link.device_uuid,
            generation: self.generation,
        });
        self.link.transport.send(request);
    }

    fn perform_locations(&mut self) {
        let Some(session) = &self.link.session else {
            error!("no login session found; unable to perform location query");
            return;
        };
        debug!("sending locations request");
        self.link.transport.send(VendorRequest::locations(session));
    }

    // ── State helpers ────────────────────────────────────────────

    fn replace_credentials(&mut self, credentials: Option<Credentials>) {
        self.generation += 1;
        self.credentials = credentials;
        self.link.session = None;
    }

    fn invalidate_credentials(&mut self) {
        let e = CoreError::Authentication {
            message: INVALID_CREDENTIALS_REASON.into(),
        };
        error!(error = %e, "configured credentials appear to be invalid; resetting them");
        self.replace_credentials(None);
        self.set_status(PluginStatus::Failed(INVALID_CREDENTIALS_REASON.into()));
    }

    fn set_status(&mut self, status: PluginStatus) {
        if self.status.as_ref() == Some(&status) {
            return;
        }
        info!(%status, "plugin status changed");
        self.status = Some(status.clone());
        self.host.report_status(status);
    }
}
