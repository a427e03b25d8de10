//!
//! Metrics service: time series graphs per host and subsystem.
//!
use crate::{Client, Result, Service};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Graph payload, passed through to presentation untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Graph {
    /// Graph title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unit of the values, e.g. "%" or "bytes/s"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// One series per plotted line
    #[serde(default)]
    pub series: Vec<Series>,
}

/// Named series of samples
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

/// A sample
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub time: chrono::DateTime<chrono::Utc>,
    pub value: f64,
}

/// Queries for graph data. Every call may block on network I/O.
#[async_trait]
pub trait MetricsClient: Send + Sync {
    /// CPU graph for all cores, or a single core
    async fn get_cpu_graph(&self, host: &str, core: Option<u32>) -> Result<Graph>;
    /// Memory graph
    async fn get_mem_graph(&self, host: &str) -> Result<Graph>;
    /// Network graph for all interfaces, or a single interface
    async fn get_network_graph(&self, host: &str, interface: Option<&str>) -> Result<Graph>;
}

#[async_trait]
impl<T: MetricsClient + ?Sized> MetricsClient for &T {
    async fn get_cpu_graph(&self, host: &str, core: Option<u32>) -> Result<Graph> {
        (**self).get_cpu_graph(host, core).await
    }

    async fn get_mem_graph(&self, host: &str) -> Result<Graph> {
        (**self).get_mem_graph(host).await
    }

    async fn get_network_graph(&self, host: &str, interface: Option<&str>) -> Result<Graph> {
        (**self).get_network_graph(host, interface).await
    }
}

#[async_trait]
impl MetricsClient for Client {
    async fn get_cpu_graph(&self, host: &str, core: Option<u32>) -> Result<Graph> {
        let core = core.map(|c| c.to_string());
        let query = core.as_deref().map(|c| [("core", c)]);
        self.get_json(
            Service::Metrics,
            &["v1", "graphs", host, "cpu"],
            query.as_ref().map(|q| &q[..]),
        )
        .await
    }

    async fn get_mem_graph(&self, host: &str) -> Result<Graph> {
        self.get_json(Service::Metrics, &["v1", "graphs", host, "memory"], None)
            .await
    }

    async fn get_network_graph(&self, host: &str, interface: Option<&str>) -> Result<Graph> {
        let query = interface.map(|i| [("interface", i)]);
        self.get_json(
            Service::Metrics,
            &["v1", "graphs", host, "network"],
            query.as_ref().map(|q| &q[..]),
        )
        .await
    }
}
