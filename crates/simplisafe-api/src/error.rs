use thiserror::Error;

/// Top-level error type for the `simplisafe-api` crate.
///
/// Covers request construction, transport, and body decoding.
/// `simplisafe-core` maps these into its own error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Build a [`Deserialization`](Self::Deserialization) error with a short body preview.
    pub(crate) fn deserialization(err: &serde_json::Error, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}
