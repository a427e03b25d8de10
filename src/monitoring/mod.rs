//!
//! Monitoring service: per-host health and utilization facts.
//!
use crate::{Client, Result, Service};
use async_trait::async_trait;

pub mod types;

pub use types::{InterfaceCounters, PartitionUsage};

/// Queries for raw per-host facts. Every call may block on network I/O.
#[async_trait]
pub trait MonitoringClient: Send + Sync {
    /// Integer health code, see [`crate::classify_health`]
    async fn get_overall_state(&self, host: &str) -> Result<i64>;
    /// Active error messages
    async fn get_errors(&self, host: &str) -> Result<Vec<String>>;
    /// Active warning messages
    async fn get_warnings(&self, host: &str) -> Result<Vec<String>>;
    /// Active notices
    async fn get_notices(&self, host: &str) -> Result<Vec<String>>;
    /// CPU load in percent
    async fn get_cpu_load(&self, host: &str) -> Result<f64>;
    /// Number of cores
    async fn get_cpu_cores(&self, host: &str) -> Result<u32>;
    /// Clock speed in MHz
    async fn get_cpu_speed(&self, host: &str) -> Result<f64>;
    /// Total memory in bytes
    async fn get_total_memory(&self, host: &str) -> Result<f64>;
    /// Memory usage in percent
    async fn get_mem_usage(&self, host: &str) -> Result<f64>;
    /// Monitored partitions, in the service's order
    async fn get_monitored_partitions(&self, host: &str) -> Result<Vec<String>>;
    /// Usage of one partition
    async fn get_partition_stats(&self, host: &str, partition: &str) -> Result<PartitionUsage>;
    /// Monitored network interfaces, in the service's order
    async fn get_monitored_interfaces(&self, host: &str) -> Result<Vec<String>>;
    /// Counters of one network interface
    async fn get_interface_stats(&self, host: &str, interface: &str) -> Result<InterfaceCounters>;
}

#[async_trait]
impl<T: MonitoringClient + ?Sized> MonitoringClient for &T {
    async fn get_overall_state(&self, host: &str) -> Result<i64> {
        (**self).get_overall_state(host).await
    }

    async fn get_errors(&self, host: &str) -> Result<Vec<String>> {
        (**self).get_errors(host).await
    }

    async fn get_warnings(&self, host: &str) -> Result<Vec<String>> {
        (**self).get_warnings(host).await
    }

    async fn get_notices(&self, host: &str) -> Result<Vec<String>> {
        (**self).get_notices(host).await
    }

    async fn get_cpu_load(&self, host: &str) -> Result<f64> {
        (**self).get_cpu_load(host).await
    }

    async fn get_cpu_cores(&self, host: &str) -> Result<u32> {
        (**self).get_cpu_cores(host).await
    }

    async fn get_cpu_speed(&self, host: &str) -> Result<f64> {
        (**self).get_cpu_speed(host).await
    }

    async fn get_total_memory(&self, host: &str) -> Result<f64> {
        (**self).get_total_memory(host).await
    }

    async fn get_mem_usage(&self, host: &str) -> Result<f64> {
        (**self).get_mem_usage(host).await
    }

    async fn get_monitored_partitions(&self, host: &str) -> Result<Vec<String>> {
        (**self).get_monitored_partitions(host).await
    }

    async fn get_partition_stats(&self, host: &str, partition: &str) -> Result<PartitionUsage> {
        (**self).get_partition_stats(host, partition).await
    }

    async fn get_monitored_interfaces(&self, host: &str) -> Result<Vec<String>> {
        (**self).get_monitored_interfaces(host).await
    }

    async fn get_interface_stats(&self, host: &str, interface: &str) -> Result<InterfaceCounters> {
        (**self).get_interface_stats(host, interface).await
    }
}

impl Client {
    async fn monitor_value<T: serde::de::DeserializeOwned>(
        &self,
        host: &str,
        path: &[&str],
    ) -> Result<T> {
        let segments: Vec<&str> = ["v1", "hosts", host].iter().chain(path).copied().collect();
        let v: types::Value<T> = self.get_json(Service::Monitoring, &segments, None).await?;
        Ok(v.value)
    }

    async fn monitor_items(&self, host: &str, path: &[&str]) -> Result<Vec<String>> {
        let segments: Vec<&str> = ["v1", "hosts", host].iter().chain(path).copied().collect();
        let items: types::Items = self.get_json(Service::Monitoring, &segments, None).await?;
        Ok(items.items)
    }
}

#[async_trait]
impl MonitoringClient for Client {
    async fn get_overall_state(&self, host: &str) -> Result<i64> {
        self.monitor_value(host, &["state"]).await
    }

    async fn get_errors(&self, host: &str) -> Result<Vec<String>> {
        self.monitor_items(host, &["alerts", "errors"]).await
    }

    async fn get_warnings(&self, host: &str) -> Result<Vec<String>> {
        self.monitor_items(host, &["alerts", "warnings"]).await
    }

    async fn get_notices(&self, host: &str) -> Result<Vec<String>> {
        self.monitor_items(host, &["alerts", "notices"]).await
    }

    async fn get_cpu_load(&self, host: &str) -> Result<f64> {
        self.monitor_value(host, &["cpu", "load"]).await
    }

    async fn get_cpu_cores(&self, host: &str) -> Result<u32> {
        self.monitor_value(host, &["cpu", "cores"]).await
    }

    async fn get_cpu_speed(&self, host: &str) -> Result<f64> {
        self.monitor_value(host, &["cpu", "speed"]).await
    }

    async fn get_total_memory(&self, host: &str) -> Result<f64> {
        self.monitor_value(host, &["memory", "total"]).await
    }

    async fn get_mem_usage(&self, host: &str) -> Result<f64> {
        self.monitor_value(host, &["memory", "usage"]).await
    }

    async fn get_monitored_partitions(&self, host: &str) -> Result<Vec<String>> {
        self.monitor_items(host, &["partitions"]).await
    }

    async fn get_partition_stats(&self, host: &str, partition: &str) -> Result<PartitionUsage> {
        self.get_json(
            Service::Monitoring,
            &["v1", "hosts", host, "partitions", partition],
            None,
        )
        .await
    }

    async fn get_monitored_interfaces(&self, host: &str) -> Result<Vec<String>> {
        self.monitor_items(host, &["interfaces"]).await
    }

    async fn get_interface_stats(&self, host: &str, interface: &str) -> Result<InterfaceCounters> {
        self.get_json(
            Service::Monitoring,
            &["v1", "hosts", host, "interfaces", interface],
            None,
        )
        .await
    }
}
