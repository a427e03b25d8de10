//!
//! Library for aggregating host telemetry from a monitoring and a metrics service.
//!
//! ## Client
//! The first step is to connect to the services
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), host_telemetry::Error> {
//!     use host_telemetry::ClientBuilder;
//!
//!     // API CA certificate loaded
//!     let ca_cert = Vec::new();
//!
//!     let client = ClientBuilder::new()
//!         .add_root_certificate(&ca_cert)?
//!         .bearer_token("secret token")
//!         .metrics_url("https://metrics.customer.net")?
//!         .connect("https://monitor.customer.net")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Fleet
//! ### Summarize a set of hosts
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), host_telemetry::Error> {
//!     use host_telemetry::{fleet::FleetAggregator, ClientBuilder, HostId};
//!
//!     let client = ClientBuilder::new().connect("https://monitor.customer.net")?;
//!
//!     let hosts = vec![HostId::new("10.0.0.9")?, HostId::new("10.0.0.2")?];
//!     let report = FleetAggregator::new(&client).run(hosts).await;
//!
//!     for entry in &report.entries {
//!         println!("{}: available={}", entry.host, entry.is_available());
//!     }
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};

pub mod classify;
pub mod detail;
pub mod fleet;
pub mod host;
pub mod metrics;
pub mod monitoring;
pub mod network;
pub mod timeout;

#[cfg(feature = "env-config")]
pub mod env_config;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify, classify_health, HealthState, UtilizationClass};

/// Error returned by client and aggregation functions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A call to an upstream service did not complete in time
    #[error("{operation} for host {host} timed out")]
    Timeout {
        /// Host the call was made for
        host: String,
        /// Name of the upstream operation
        operation: &'static str,
    },

    /// Failed returned by the HTTP server
    #[error("HTTP failed {0}, {1}")]
    WebServer(u16, String),

    /// JSON serialization/deserialization error
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL: {0}")]
    URL(#[from] url::ParseError),

    /// HTTP client error
    #[error("Reqwest: {0}")]
    HTTPClient(#[from] reqwest::Error),

    /// This error is returned if we get data from upstream we can't parse/understand
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Caller supplied an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required environment variable is missing
    #[error("Missing environment variable '{0}'")]
    MissingEnv(String),

    /// IO Errors
    #[error("IO error {0}")]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed response error
    #[must_use]
    pub fn malformed(err: &str) -> Self {
        Self::MalformedResponse(err.to_string())
    }

    /// Returns true if the failure is worth retrying, i.e. a network problem or
    /// an overloaded upstream rather than a bad answer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::HTTPClient(e) => !e.is_decode() && !e.is_builder(),
            Self::WebServer(status, _) => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Identifier of a monitored host, an address or a hostname.
///
/// Ordering is lexicographic on the identifier string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

impl HostId {
    /// Create a host identifier, rejecting empty names
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("empty host identifier".into()));
        }
        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Host identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for HostId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Upstream service a request is sent to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Service {
    /// Health and utilization facts
    Monitoring,
    /// Time series graphs
    Metrics,
}

/// Builder for a [`Client`]
#[derive(Clone)]
pub struct ClientBuilder {
    reqwest_ca: Vec<reqwest::Certificate>,
    disable_cert_verification: bool,
    token: Option<String>,
    metrics_url: Option<url::Url>,
    timeout: Option<std::time::Duration>,
}

impl ClientBuilder {
    /// Create a new builder instance
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reqwest_ca: Vec::new(),
            disable_cert_verification: false,
            token: None,
            metrics_url: None,
            timeout: None,
        }
    }

    /// Add a root certificate for API certificate verification
    pub fn add_root_certificate(mut self, cert: &[u8]) -> Result<Self> {
        let r_ca = reqwest::Certificate::from_pem(cert)?;
        self.reqwest_ca.push(r_ca);
        Ok(self)
    }

    /// Disable certificate verification
    #[must_use]
    pub fn danger_accept_invalid_certs(self) -> Self {
        Self {
            disable_cert_verification: true,
            ..self
        }
    }

    /// Bearer token sent with every request
    #[must_use]
    pub fn bearer_token(self, token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..self
        }
    }

    /// Metrics service location, defaults to the monitoring service URL
    pub fn metrics_url(self, url: &str) -> Result<Self> {
        Ok(Self {
            metrics_url: Some(url::Url::parse(url)?),
            ..self
        })
    }

    /// Timeout applied to each HTTP request
    #[must_use]
    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Build a client talking to the monitoring service at `monitor_url`
    pub fn connect(&self, monitor_url: &str) -> Result<Client> {
        let monitor_url = url::Url::parse(monitor_url)?;
        if monitor_url.cannot_be_a_base() {
            return Err(Error::URL(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let client = reqwest::Client::builder();

        // Add CA certificates
        let client = self
            .reqwest_ca
            .iter()
            .fold(client, |client, ca| client.add_root_certificate(ca.clone()));

        let client = client.danger_accept_invalid_certs(self.disable_cert_verification);

        let client = match self.timeout {
            Some(timeout) => client.timeout(timeout),
            None => client,
        };

        let client = client.build()?;

        let metrics_url = self
            .metrics_url
            .clone()
            .unwrap_or_else(|| monitor_url.clone());

        tracing::debug!("monitoring at {}, metrics at {}", monitor_url, metrics_url);

        Ok(Client {
            monitor_url,
            metrics_url,
            token: self.token.clone(),
            client,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The `Client` talks JSON over HTTP to the monitoring and metrics services.
/// It implements both [`monitoring::MonitoringClient`] and [`metrics::MetricsClient`].
#[derive(Clone)]
pub struct Client {
    monitor_url: url::Url,
    metrics_url: url::Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("monitor_url", &self.monitor_url)
            .field("metrics_url", &self.metrics_url)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a Client builder
    #[must_use]
    pub const fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    fn base_url(&self, service: Service) -> &url::Url {
        match service {
            Service::Monitoring => &self.monitor_url,
            Service::Metrics => &self.metrics_url,
        }
    }

    /// GET a json payload from one of the services. Path segments are
    /// percent-encoded.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: Service,
        segments: &[&str],
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let url = self.base_url(service).with_segments(segments)?;

        tracing::debug!("GET {}", url);

        let mut builder = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(qp) = query_params {
            builder = builder.query(qp);
        }

        let result = builder.send().await?;

        if result.status().is_success() {
            let bytes = result.bytes().await?;
            let res = serde_json::from_slice(&bytes)?;
            Ok(res)
        } else {
            let status = result.status();
            tracing::debug!("GET returned {}", status);
            Err(Error::WebServer(status.as_u16(), status.to_string()))
        }
    }
}

pub(crate) trait URLExt {
    fn with_segments(&self, segments: &[&str]) -> std::result::Result<url::Url, url::ParseError>;
}

impl URLExt for url::Url {
    fn with_segments(&self, segments: &[&str]) -> std::result::Result<url::Url, url::ParseError> {
        let mut url = self.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
