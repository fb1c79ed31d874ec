// ── Controller runtime ──
//
// A single tokio task owns the `Controller`. Everything that can change
// controller state arrives as a `ControllerEvent` on one mpsc channel:
// configuration from the handle, ticks from the interval, and HTTP
// completions posted back by the per-request tasks `HttpTransport` spawns.
// Host-facing output fans out over broadcast and watch channels.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use simplisafe_api::{
    HttpResponse, RequestKind, SimpliSafeClient, TlsMode, TransportConfig, VendorRequest,
};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Configuration, RuntimeConfig, TlsVerification};
use crate::controller::{Controller, ControllerState};
use crate::error::CoreError;
use crate::host::{Host, PluginStatus, StationInfo, Variable};
use crate::transport::Transport;

const EVENT_CHANNEL_SIZE: usize = 256;
const HOST_EVENT_CHANNEL_SIZE: usize = 256;
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

// ── Events ───────────────────────────────────────────────────────

/// Input to the controller task.
#[derive(Debug)]
pub enum ControllerEvent {
    Configure(Configuration),
    Tick,
    HttpResponse {
        kind: RequestKind,
        response: HttpResponse,
    },
    HttpFailure {
        kind: RequestKind,
        error: CoreError,
    },
    SetVariable {
        location: String,
        variable: Variable,
        value: bool,
    },
}

/// Output from the controller, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum HostEvent {
    Published(StationInfo),
    VariableChanged {
        location: String,
        variable: Variable,
        value: bool,
    },
    Status(PluginStatus),
}

// ── HTTP transport ───────────────────────────────────────────────

/// Executes each request on its own task and posts the completion back
/// to the controller's event channel.
struct HttpTransport {
    client: SimpliSafeClient,
    events: mpsc::Sender<ControllerEvent>,
    cancel: CancellationToken,
}

impl Transport for HttpTransport {
    fn send(&mut self, request: VendorRequest) {
        let client = self.client.clone();
        let events = self.events.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                result = client.execute(&request) => result,
            };
            let kind = request.kind;
            let event = match result {
                Ok(response) => ControllerEvent::HttpResponse { kind, response },
                Err(e) => ControllerEvent::HttpFailure {
                    kind,
                    error: e.into(),
                },
            };
            if events.send(event).await.is_err() {
                debug!("controller stopped before completion was delivered");
            }
        });
    }
}

// ── Channel host ─────────────────────────────────────────────────

struct ChannelHost {
    events: broadcast::Sender<HostEvent>,
    status: watch::Sender<Option<PluginStatus>>,
    stations: watch::Sender<BTreeMap<String, StationInfo>>,
}

impl ChannelHost {
    fn emit(&self, event: HostEvent) {
        // No subscribers is fine; the watches still carry the latest state.
        let _ = self.events.send(event);
    }
}

impl Host for ChannelHost {
    fn publish(&mut self, station: &StationInfo) {
        info!(location = %station.id, name = %station.name, "base station discovered");
        self.stations.send_modify(|stations| {
            stations.insert(station.id.clone(), station.clone());
        });
        self.emit(HostEvent::Published(station.clone()));
    }

    fn variable_changed(&mut self, location: &str, variable: Variable, value: bool) {
        info!(location, %variable, value, "variable changed");
        self.stations.send_modify(|stations| {
            if let Some(station) = stations.get_mut(location) {
                match variable {
                    Variable::Armed => station.armed = Some(value),
                }
            }
        });
        self.emit(HostEvent::VariableChanged {
            location: location.to_owned(),
            variable,
            value,
        });
    }

    fn report_status(&mut self, status: PluginStatus) {
        self.status.send_replace(Some(status.clone()));
        self.emit(HostEvent::Status(status));
    }
}

// ── Handle ───────────────────────────────────────────────────────

/// Cheaply cloneable handle to a running controller task.
#[derive(Clone)]
pub struct ControllerHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    events: mpsc::Sender<ControllerEvent>,
    host_events: broadcast::Sender<HostEvent>,
    status: watch::Receiver<Option<PluginStatus>>,
    stations: watch::Receiver<BTreeMap<String, StationInfo>>,
    state: watch::Receiver<ControllerState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ControllerHandle {
    /// Build the HTTP client and start the controller task.
    ///
    /// The controller starts unconfigured. Subscribe first, then call
    /// [`configure`](Self::configure) to see every event.
    pub fn spawn(config: &RuntimeConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            },
            ..transport
        };
        let client = SimpliSafeClient::new(config.base_url.clone(), &transport)?;
        Ok(Self::with_client(client, config.refresh_interval))
    }

    /// Start the controller task around a pre-built client.
    ///
    /// Intervals shorter than one second are raised to one second.
    pub fn with_client(client: SimpliSafeClient, refresh_interval: Duration) -> Self {
        let refresh_interval = refresh_interval.max(MIN_REFRESH_INTERVAL);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (host_events, _) = broadcast::channel(HOST_EVENT_CHANNEL_SIZE);
        let (status_tx, status_rx) = watch::channel(None);
        let (stations_tx, stations_rx) = watch::channel(BTreeMap::new());
        let (state_tx, state_rx) = watch::channel(ControllerState::NotConfigured);
        let cancel = CancellationToken::new();

        let transport = HttpTransport {
            client,
            events: event_tx.clone(),
            cancel: cancel.clone(),
        };
        let host = ChannelHost {
            events: host_events.clone(),
            status: status_tx,
            stations: stations_tx,
        };
        let controller = Controller::new(transport, host);
        debug!(device_uuid = %controller.device_uuid(), "controller created");

        let task = tokio::spawn(controller_task(
            controller,
            event_rx,
            state_tx,
            refresh_interval,
            cancel.clone(),
        ));

        Self {
            inner: Arc::new(HandleInner {
                events: event_tx,
                host_events,
                status: status_rx,
                stations: stations_rx,
                state: state_rx,
                cancel,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    /// Apply a configuration update (startup or reload).
    pub async fn configure(&self, config: Configuration) -> Result<(), CoreError> {
        self.post(ControllerEvent::Configure(config)).await
    }

    /// Arm (`away`) or disarm (`home`) a base station.
    pub async fn set_armed(&self, location: &str, armed: bool) -> Result<(), CoreError> {
        self.post(ControllerEvent::SetVariable {
            location: location.to_owned(),
            variable: Variable::Armed,
            value: armed,
        })
        .await
    }

    /// Run one lifecycle step now instead of waiting for the interval.
    pub async fn refresh_now(&self) -> Result<(), CoreError> {
        self.post(ControllerEvent::Tick).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.inner.host_events.subscribe()
    }

    /// Latest reported plugin status; `None` before the first report.
    pub fn status(&self) -> watch::Receiver<Option<PluginStatus>> {
        self.inner.status.clone()
    }

    /// Published base stations keyed by location id.
    pub fn stations(&self) -> watch::Receiver<BTreeMap<String, StationInfo>> {
        self.inner.stations.clone()
    }

    pub fn state(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.clone()
    }

    /// Stop the controller task and abandon in-flight requests.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(task) = self.inner.task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "controller task ended abnormally");
            }
        }
    }

    async fn post(&self, event: ControllerEvent) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }
        self.inner
            .events
            .send(event)
            .await
            .map_err(|_| CoreError::Disconnected)
    }
}

// ── Task ─────────────────────────────────────────────────────────

async fn controller_task<T: Transport, H: Host>(
    mut controller: Controller<T, H>,
    mut rx: mpsc::Receiver<ControllerEvent>,
    state: watch::Sender<ControllerState>,
    refresh_interval: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick
    let mut started = false;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                apply(&mut controller, event, &mut started);
            }
            _ = interval.tick() => controller.on_tick(),
        }
        state.send_if_modified(|current| {
            let next = controller.state();
            let changed = *current != next;
            *current = next;
            changed
        });
    }

    debug!("controller task stopped");
}

fn apply<T: Transport, H: Host>(
    controller: &mut Controller<T, H>,
    event: ControllerEvent,
    started: &mut bool,
) {
    match event {
        ControllerEvent::Configure(config) if !*started => {
            *started = true;
            controller.on_startup(&config);
        }
        ControllerEvent::Configure(config) => controller.on_configuration_update(&config),
        ControllerEvent::Tick => controller.on_tick(),
        ControllerEvent::HttpResponse { kind, response } => {
            controller.on_http_response(&kind, &response);
        }
        ControllerEvent::HttpFailure { kind, error } => controller.on_http_failure(&kind, &error),
        ControllerEvent::SetVariable {
            location,
            variable,
            value,
        } => controller.on_set_variable(&location, variable, value),
    }
}
