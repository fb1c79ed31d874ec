// simplisafe-api: Wire types and async HTTP client for the SimpliSafe mobile API

pub mod client;
pub mod error;
pub mod models;
pub mod request;
pub mod session;
pub mod transport;

pub use client::{HttpResponse, SimpliSafeClient};
pub use error::Error;
pub use models::{AlarmMode, LocationsResponse, LoginResponse, StateResponse};
pub use request::{LoginForm, RequestKind, VendorRequest};
pub use session::{Cookie, Session};
pub use transport::{TlsMode, TransportConfig};

/// Default vendor endpoint.
pub const DEFAULT_BASE_URL: &str = "https://simplisafe.com";
