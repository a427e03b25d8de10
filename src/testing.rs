//!
//! In-memory monitoring and metrics service for tests.
//!
use crate::metrics::{Graph, MetricsClient};
use crate::monitoring::{InterfaceCounters, MonitoringClient, PartitionUsage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct HostFixture {
    pub state: i64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub notices: Vec<String>,
    pub cpu_load: f64,
    pub cpu_cores: u32,
    pub cpu_speed: f64,
    pub total_memory: f64,
    pub mem_usage: f64,
    pub partitions: Vec<(String, PartitionUsage)>,
    pub interfaces: Vec<(String, InterfaceCounters)>,
    /// Every call answers 503
    pub failing: bool,
    /// Every call never completes
    pub stalled: bool,
    /// Only the memory usage call answers 503
    pub failing_mem_usage: bool,
}

impl HostFixture {
    pub fn healthy() -> Self {
        Self {
            state: 1,
            errors: Vec::new(),
            warnings: vec!["disk almost full".to_string()],
            notices: Vec::new(),
            cpu_load: 25.0,
            cpu_cores: 4,
            cpu_speed: 2400.0,
            total_memory: 8_000_000_000.0,
            mem_usage: 50.0,
            partitions: vec![
                (
                    "/".to_string(),
                    PartitionUsage {
                        total: 100,
                        used: 40,
                    },
                ),
                (
                    "/var".to_string(),
                    PartitionUsage {
                        total: 200,
                        used: 190,
                    },
                ),
            ],
            interfaces: vec![
                ("eth0".to_string(), counters(100, 50.0)),
                ("eth1".to_string(), counters(50, 80.0)),
            ],
            failing: false,
            stalled: false,
            failing_mem_usage: false,
        }
    }

    pub fn failing(self) -> Self {
        Self {
            failing: true,
            ..self
        }
    }

    pub fn stalled(self) -> Self {
        Self {
            stalled: true,
            ..self
        }
    }
}

pub fn counters(bandwidth: u64, used: f64) -> InterfaceCounters {
    InterfaceCounters {
        bandwidth,
        rx: bandwidth.saturating_mul(10),
        tx: bandwidth.saturating_mul(20),
        used,
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeTelemetry {
    hosts: HashMap<String, HostFixture>,
}

impl FakeTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, fixture: HostFixture) -> Self {
        self.hosts.insert(host.to_string(), fixture);
        self
    }

    async fn host(&self, host: &str) -> Result<&HostFixture> {
        let fixture = self
            .hosts
            .get(host)
            .ok_or_else(|| Error::WebServer(404, "404 Not Found".to_string()))?;
        if fixture.stalled {
            std::future::pending::<()>().await;
        }
        if fixture.failing {
            return Err(Error::WebServer(503, "503 Service Unavailable".to_string()));
        }
        Ok(fixture)
    }
}

#[async_trait]
impl MonitoringClient for FakeTelemetry {
    async fn get_overall_state(&self, host: &str) -> Result<i64> {
        Ok(self.host(host).await?.state)
    }

    async fn get_errors(&self, host: &str) -> Result<Vec<String>> {
        Ok(self.host(host).await?.errors.clone())
    }

    async fn get_warnings(&self, host: &str) -> Result<Vec<String>> {
        Ok(self.host(host).await?.warnings.clone())
    }

    async fn get_notices(&self, host: &str) -> Result<Vec<String>> {
        Ok(self.host(host).await?.notices.clone())
    }

    async fn get_cpu_load(&self, host: &str) -> Result<f64> {
        Ok(self.host(host).await?.cpu_load)
    }

    async fn get_cpu_cores(&self, host: &str) -> Result<u32> {
        Ok(self.host(host).await?.cpu_cores)
    }

    async fn get_cpu_speed(&self, host: &str) -> Result<f64> {
        Ok(self.host(host).await?.cpu_speed)
    }

    async fn get_total_memory(&self, host: &str) -> Result<f64> {
        Ok(self.host(host).await?.total_memory)
    }

    async fn get_mem_usage(&self, host: &str) -> Result<f64> {
        let fixture = self.host(host).await?;
        if fixture.failing_mem_usage {
            return Err(Error::WebServer(503, "503 Service Unavailable".to_string()));
        }
        Ok(fixture.mem_usage)
    }

    async fn get_monitored_partitions(&self, host: &str) -> Result<Vec<String>> {
        let fixture = self.host(host).await?;
        Ok(fixture.partitions.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn get_partition_stats(&self, host: &str, partition: &str) -> Result<PartitionUsage> {
        self.host(host)
            .await?
            .partitions
            .iter()
            .find(|(n, _)| n == partition)
            .map(|(_, usage)| *usage)
            .ok_or_else(|| Error::WebServer(404, "404 Not Found".to_string()))
    }

    async fn get_monitored_interfaces(&self, host: &str) -> Result<Vec<String>> {
        let fixture = self.host(host).await?;
        Ok(fixture.interfaces.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn get_interface_stats(&self, host: &str, interface: &str) -> Result<InterfaceCounters> {
        self.host(host)
            .await?
            .interfaces
            .iter()
            .find(|(n, _)| n == interface)
            .map(|(_, counters)| *counters)
            .ok_or_else(|| Error::WebServer(404, "404 Not Found".to_string()))
    }
}

#[async_trait]
impl MetricsClient for FakeTelemetry {
    async fn get_cpu_graph(&self, host: &str, core: Option<u32>) -> Result<Graph> {
        self.host(host).await?;
        Ok(graph(match core {
            Some(core) => format!("cpu {host} core {core}"),
            None => format!("cpu {host}"),
        }))
    }

    async fn get_mem_graph(&self, host: &str) -> Result<Graph> {
        self.host(host).await?;
        Ok(graph(format!("memory {host}")))
    }

    async fn get_network_graph(&self, host: &str, interface: Option<&str>) -> Result<Graph> {
        self.host(host).await?;
        Ok(graph(match interface {
            Some(interface) => format!("network {host} {interface}"),
            None => format!("network {host}"),
        }))
    }
}

fn graph(title: String) -> Graph {
    Graph {
        title: Some(title),
        ..Graph::default()
    }
}
