//!
//! Fleet overview: summaries of many hosts, fetched concurrently.
//!
use crate::host::{host_overview, HostOverview, HostSummary};
use crate::monitoring::MonitoringClient;
use crate::timeout::{TimeoutClient, DEFAULT_CALL_TIMEOUT};
use crate::{Error, HostId};
use futures_util::StreamExt;
use serde::ser::SerializeMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;
use tracing_futures::Instrument;

/// [`FleetAggregator`] options
#[derive(Clone, Copy, Debug)]
pub struct FleetOptions {
    /// Maximum number of hosts queried at the same time
    pub concurrency: usize,
    /// Limit for every single upstream call
    pub call_timeout: Duration,
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// What became of one host
#[derive(Debug)]
pub enum Outcome {
    /// All values were fetched
    Available(Box<HostOverview>),
    /// Some value could not be fetched
    Unavailable(Error),
    /// The run was cancelled before the host finished
    Cancelled,
}

/// One row of the fleet overview
#[derive(Debug)]
pub struct FleetEntry {
    pub host: HostId,
    pub outcome: Outcome,
}

impl FleetEntry {
    /// Returns true if the host summary is present
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.outcome, Outcome::Available(_))
    }

    /// The host record, if it could be fetched
    #[must_use]
    pub fn overview(&self) -> Option<&HostOverview> {
        match &self.outcome {
            Outcome::Available(overview) => Some(overview),
            _ => None,
        }
    }

    /// The host summary, if it could be fetched
    #[must_use]
    pub fn summary(&self) -> Option<&HostSummary> {
        self.overview().map(|overview| &overview.summary)
    }
}

impl Serialize for FleetEntry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("host", &self.host)?;
        match &self.outcome {
            Outcome::Available(overview) => {
                map.serialize_entry("status", "available")?;
                map.serialize_entry("summary", overview)?;
            }
            Outcome::Unavailable(err) => {
                map.serialize_entry("status", "unavailable")?;
                map.serialize_entry("reason", &err.to_string())?;
            }
            Outcome::Cancelled => {
                map.serialize_entry("status", "cancelled")?;
            }
        }
        map.end()
    }
}

/// Result of a fleet run, one entry per distinct host ordered by host
#[derive(Debug, Serialize)]
pub struct FleetReport {
    pub entries: Vec<FleetEntry>,
    /// Set when the run was cancelled before every host finished
    pub partial: bool,
}

impl FleetReport {
    /// Number of hosts with a summary
    #[must_use]
    pub fn available(&self) -> usize {
        self.entries.iter().filter(|e| e.is_available()).count()
    }

    /// Entry of a single host
    #[must_use]
    pub fn get(&self, host: &HostId) -> Option<&FleetEntry> {
        self.entries
            .binary_search_by(|e| e.host.cmp(host))
            .ok()
            .map(|ix| &self.entries[ix])
    }
}

/// Cancellation future for [`FleetAggregator::run_until`] driven by a signal
/// listener such as `tokio::signal::ctrl_c()`.
///
/// Completes when the signal arrives. If the listener can not be installed the
/// failure is logged and the future never completes, so the run is not cut short.
pub async fn cancel_on<F, E>(signal: F)
where
    F: Future<Output = std::result::Result<(), E>>,
    E: std::fmt::Display,
{
    match signal.await {
        Ok(()) => tracing::info!("Interrupted, reporting what was collected"),
        Err(e) => {
            tracing::warn!("Failed to listen for the interrupt signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Summarizes a set of hosts using a monitoring client
pub struct FleetAggregator<'a, M: ?Sized> {
    monitor: &'a M,
    options: FleetOptions,
}

impl<'a, M: MonitoringClient + ?Sized> FleetAggregator<'a, M> {
    /// Create an aggregator with default options
    pub fn new(monitor: &'a M) -> Self {
        Self {
            monitor,
            options: FleetOptions::default(),
        }
    }

    /// Replace the options
    #[must_use]
    pub fn with_options(self, options: FleetOptions) -> Self {
        Self { options, ..self }
    }

    /// Fetch the overview of every host. Duplicates are queried once.
    pub async fn run<I>(&self, hosts: I) -> FleetReport
    where
        I: IntoIterator<Item = HostId>,
    {
        self.run_until(hosts, std::future::pending()).await
    }

    /// Fetch the overview of every host, stopping early when `cancel` completes.
    ///
    /// Hosts that finished before cancellation keep their outcome; the rest are
    /// reported as [`Outcome::Cancelled`] and the report is marked partial.
    pub async fn run_until<I, F>(&self, hosts: I, cancel: F) -> FleetReport
    where
        I: IntoIterator<Item = HostId>,
        F: Future<Output = ()>,
    {
        let hosts: BTreeSet<HostId> = hosts.into_iter().collect();
        let monitor = TimeoutClient::new(self.monitor, self.options.call_timeout);
        let monitor = &monitor;

        tracing::debug!(
            "summarizing {} hosts, {} at a time",
            hosts.len(),
            self.options.concurrency
        );

        let mut pending = futures_util::stream::iter(hosts.clone())
            .map(|host| {
                let span = tracing::debug_span!("fleet_host", host = %host);
                async move {
                    let result = host_overview(monitor, &host).await;
                    (host, result)
                }
                .instrument(span)
            })
            .buffer_unordered(self.options.concurrency.max(1));

        tokio::pin!(cancel);

        let mut done: BTreeMap<HostId, Outcome> = BTreeMap::new();
        let partial = loop {
            tokio::select! {
                biased;
                () = &mut cancel => break done.len() < hosts.len(),
                next = pending.next() => match next {
                    Some((host, Ok(overview))) => {
                        done.insert(host, Outcome::Available(Box::new(overview)));
                    }
                    Some((host, Err(err))) => {
                        tracing::warn!("host {} unavailable: {}", host, err);
                        done.insert(host, Outcome::Unavailable(err));
                    }
                    None => break false,
                },
            }
        };
        drop(pending);

        let entries: Vec<FleetEntry> = hosts
            .into_iter()
            .map(|host| {
                let outcome = done.remove(&host).unwrap_or(Outcome::Cancelled);
                FleetEntry { host, outcome }
            })
            .collect();

        let report = FleetReport { entries, partial };
        tracing::info!(
            "fleet summary: {} of {} hosts available{}",
            report.available(),
            report.entries.len(),
            if partial { " (partial)" } else { "" }
        );
        report
    }
}
