//!
//! Per-call deadlines for monitoring and metrics clients.
//!
use crate::metrics::{Graph, MetricsClient};
use crate::monitoring::{InterfaceCounters, MonitoringClient, PartitionUsage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Default limit for a single upstream call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a client so that every call fails with [`Error::Timeout`] if it takes
/// longer than the limit.
#[derive(Clone, Debug)]
pub struct TimeoutClient<C> {
    inner: C,
    limit: Duration,
}

impl<C> TimeoutClient<C> {
    /// Wrap `inner`, bounding each call by `limit`
    pub const fn new(inner: C, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// The wrapped client
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        host: &str,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        if let Ok(result) = tokio::time::timeout(self.limit, call).await {
            result
        } else {
            tracing::debug!("{} for {} exceeded {:?}", operation, host, self.limit);
            Err(Error::Timeout {
                host: host.to_string(),
                operation,
            })
        }
    }
}

#[async_trait]
impl<C: MonitoringClient> MonitoringClient for TimeoutClient<C> {
    async fn get_overall_state(&self, host: &str) -> Result<i64> {
        self.bounded(host, "get_overall_state", self.inner.get_overall_state(host))
            .await
    }

    async fn get_errors(&self, host: &str) -> Result<Vec<String>> {
        self.bounded(host, "get_errors", self.inner.get_errors(host))
            .await
    }

    async fn get_warnings(&self, host: &str) -> Result<Vec<String>> {
        self.bounded(host, "get_warnings", self.inner.get_warnings(host))
            .await
    }

    async fn get_notices(&self, host: &str) -> Result<Vec<String>> {
        self.bounded(host, "get_notices", self.inner.get_notices(host))
            .await
    }

    async fn get_cpu_load(&self, host: &str) -> Result<f64> {
        self.bounded(host, "get_cpu_load", self.inner.get_cpu_load(host))
            .await
    }

    async fn get_cpu_cores(&self, host: &str) -> Result<u32> {
        self.bounded(host, "get_cpu_cores", self.inner.get_cpu_cores(host))
            .await
    }

    async fn get_cpu_speed(&self, host: &str) -> Result<f64> {
        self.bounded(host, "get_cpu_speed", self.inner.get_cpu_speed(host))
            .await
    }

    async fn get_total_memory(&self, host: &str) -> Result<f64> {
        self.bounded(host, "get_total_memory", self.inner.get_total_memory(host))
            .await
    }

    async fn get_mem_usage(&self, host: &str) -> Result<f64> {
        self.bounded(host, "get_mem_usage", self.inner.get_mem_usage(host))
            .await
    }

    async fn get_monitored_partitions(&self, host: &str) -> Result<Vec<String>> {
        self.bounded(
            host,
            "get_monitored_partitions",
            self.inner.get_monitored_partitions(host),
        )
        .await
    }

    async fn get_partition_stats(&self, host: &str, partition: &str) -> Result<PartitionUsage> {
        self.bounded(
            host,
            "get_partition_stats",
            self.inner.get_partition_stats(host, partition),
        )
        .await
    }

    async fn get_monitored_interfaces(&self, host: &str) -> Result<Vec<String>> {
        self.bounded(
            host,
            "get_monitored_interfaces",
            self.inner.get_monitored_interfaces(host),
        )
        .await
    }

    async fn get_interface_stats(&self, host: &str, interface: &str) -> Result<InterfaceCounters> {
        self.bounded(
            host,
            "get_interface_stats",
            self.inner.get_interface_stats(host, interface),
        )
        .await
    }
}

#[async_trait]
impl<C: MetricsClient> MetricsClient for TimeoutClient<C> {
    async fn get_cpu_graph(&self, host: &str, core: Option<u32>) -> Result<Graph> {
        self.bounded(host, "get_cpu_graph", self.inner.get_cpu_graph(host, core))
            .await
    }

    async fn get_mem_graph(&self, host: &str) -> Result<Graph> {
        self.bounded(host, "get_mem_graph", self.inner.get_mem_graph(host))
            .await
    }

    async fn get_network_graph(&self, host: &str, interface: Option<&str>) -> Result<Graph> {
        self.bounded(
            host,
            "get_network_graph",
            self.inner.get_network_graph(host, interface),
        )
        .await
    }
}
