//!
//! Single host detail and graph backed statistics views.
//!
use crate::host::{self, CpuSnapshot, HostSummary, MemorySnapshot, PartitionStat};
use crate::metrics::{Graph, MetricsClient};
use crate::monitoring::MonitoringClient;
use crate::network::{self, InterfaceAggregate, InterfaceFilter, InterfaceStat, NetworkReport};
use crate::{HostId, Result};
use serde::Serialize;

/// Graphs shown on the host detail page
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostGraphs {
    pub cpu: Graph,
    pub memory: Graph,
    pub network: Graph,
}

/// Summary of one host extended with disks, network and graphs
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostDetail {
    #[serde(flatten)]
    pub summary: HostSummary,
    pub partitions: Vec<PartitionStat>,
    pub interfaces: Vec<InterfaceStat>,
    pub network_total: InterfaceAggregate,
    pub graphs: HostGraphs,
}

/// A graph and the current values it plots
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsView<T> {
    pub graph: Graph,
    pub stats: T,
}

/// Collect everything known about one host
#[tracing::instrument(skip_all, fields(host = %host))]
pub async fn host_detail<M, G>(monitor: &M, metrics: &G, host: &HostId) -> Result<HostDetail>
where
    M: MonitoringClient + ?Sized,
    G: MetricsClient + ?Sized,
{
    let name = host.as_str();
    let (summary, partitions, network, cpu_graph, mem_graph, net_graph) = futures_util::try_join!(
        host::host_summary(monitor, host),
        host::partitions(monitor, host),
        network::network_report(monitor, host, &InterfaceFilter::All),
        metrics.get_cpu_graph(name, None),
        metrics.get_mem_graph(name),
        metrics.get_network_graph(name, None),
    )?;

    let NetworkReport { interfaces, total } = network;

    Ok(HostDetail {
        summary,
        partitions,
        interfaces,
        network_total: total.unwrap_or_default(),
        graphs: HostGraphs {
            cpu: cpu_graph,
            memory: mem_graph,
            network: net_graph,
        },
    })
}

/// Network graph and interface rows, for every interface or a single one
pub async fn network_stats<M, G>(
    monitor: &M,
    metrics: &G,
    host: &HostId,
    filter: &InterfaceFilter,
) -> Result<StatsView<NetworkReport>>
where
    M: MonitoringClient + ?Sized,
    G: MetricsClient + ?Sized,
{
    let (graph, stats) = futures_util::try_join!(
        metrics.get_network_graph(host.as_str(), filter.interface()),
        network::network_report(monitor, host, filter),
    )?;
    Ok(StatsView { graph, stats })
}

/// CPU graph, for every core or a single one, with the current CPU values
pub async fn cpu_stats<M, G>(
    monitor: &M,
    metrics: &G,
    host: &HostId,
    core: Option<u32>,
) -> Result<StatsView<CpuSnapshot>>
where
    M: MonitoringClient + ?Sized,
    G: MetricsClient + ?Sized,
{
    let (graph, stats) = futures_util::try_join!(
        metrics.get_cpu_graph(host.as_str(), core),
        host::cpu_snapshot(monitor, host),
    )?;
    Ok(StatsView { graph, stats })
}

/// Memory graph with the current memory values
pub async fn memory_stats<M, G>(
    monitor: &M,
    metrics: &G,
    host: &HostId,
) -> Result<StatsView<MemorySnapshot>>
where
    M: MonitoringClient + ?Sized,
    G: MetricsClient + ?Sized,
{
    let (graph, stats) = futures_util::try_join!(
        metrics.get_mem_graph(host.as_str()),
        host::memory_snapshot(monitor, host),
    )?;
    Ok(StatsView { graph, stats })
}

/// Current usage of every monitored partition. The metrics service keeps no
/// disk graph, so the view carries the rows only.
pub async fn disk_stats<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<Vec<PartitionStat>> {
    host::partitions(monitor, host).await
}
