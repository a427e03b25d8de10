//!
//! Single host summaries: health, alerts, CPU, memory, partitions and the
//! fleet overview record.
//!
use crate::classify::{classify, classify_health, HealthState, UtilizationClass};
use crate::monitoring::{MonitoringClient, PartitionUsage};
use crate::network::{network_report, InterfaceAggregate, InterfaceFilter};
use crate::{Error, HostId, Result};
use bytesize::ByteSize;
use serde::Serialize;

/// Active alert messages, in the order the monitoring service reports them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Alerts {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub notices: Vec<String>,
}

/// CPU
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CpuSnapshot {
    /// Load in percent
    pub load_percent: f64,
    pub cores: u32,
    /// Clock speed in MHz
    pub speed_mhz: f64,
    pub class: UtilizationClass,
}

impl CpuSnapshot {
    /// Build from raw values; the load must be a finite, non-negative percentage
    pub fn new(load_percent: f64, cores: u32, speed_mhz: f64) -> Result<Self> {
        check_percent("cpu load", load_percent)?;
        if !speed_mhz.is_finite() || speed_mhz < 0.0 {
            return Err(Error::MalformedResponse(format!("cpu speed {speed_mhz}")));
        }
        Ok(Self {
            load_percent,
            cores,
            speed_mhz,
            class: classify(load_percent),
        })
    }
}

/// Memory
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemorySnapshot {
    pub total_bytes: f64,
    pub used_percent: f64,
    /// Derived from the total and the percentage
    pub used_bytes: f64,
    pub class: UtilizationClass,
}

impl MemorySnapshot {
    /// Build from the reported total and usage percentage.
    ///
    /// A host reporting no memory has zero bytes in use, whatever the percentage.
    pub fn new(total_bytes: f64, used_percent: f64) -> Result<Self> {
        check_percent("memory usage", used_percent)?;
        if !total_bytes.is_finite() || total_bytes < 0.0 {
            return Err(Error::MalformedResponse(format!(
                "total memory {total_bytes}"
            )));
        }
        let used_bytes = if total_bytes == 0.0 {
            0.0
        } else {
            used_percent / 100.0 * total_bytes
        };
        Ok(Self {
            total_bytes,
            used_percent,
            used_bytes,
            class: classify(used_percent),
        })
    }

    /// Human readable "used / total"
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn display_usage(&self) -> String {
        format!(
            "{} / {}",
            ByteSize::b(self.used_bytes as u64),
            ByteSize::b(self.total_bytes as u64)
        )
    }
}

/// Everything the fleet overview shows for one host
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostSummary {
    pub host: HostId,
    /// Raw code the health was derived from
    pub state_code: i64,
    pub health: HealthState,
    pub alerts: Alerts,
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
}

/// Fleet record of one host: the summary with disk usage and the network aggregate
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostOverview {
    #[serde(flatten)]
    pub summary: HostSummary,
    pub partitions: Vec<PartitionStat>,
    pub network_total: InterfaceAggregate,
}

/// Disk partition usage
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionStat {
    pub name: String,
    /// Capacity in bytes
    pub total: u64,
    /// Used bytes
    pub used: u64,
    /// Used space in percent, zero for an empty partition
    pub used_percent: f64,
    pub class: UtilizationClass,
}

impl PartitionStat {
    /// Build from raw usage; used space can not exceed the capacity
    #[allow(clippy::cast_precision_loss)]
    pub fn new(name: &str, usage: PartitionUsage) -> Result<Self> {
        if usage.used > usage.total {
            return Err(Error::MalformedResponse(format!(
                "partition {name} uses {} of {} bytes",
                usage.used, usage.total
            )));
        }
        let used_percent = if usage.total == 0 {
            0.0
        } else {
            usage.used as f64 / usage.total as f64 * 100.0
        };
        Ok(Self {
            name: name.to_string(),
            total: usage.total,
            used: usage.used,
            used_percent,
            class: classify(used_percent),
        })
    }
}

impl std::fmt::Display for PartitionStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} / {}",
            self.name,
            ByteSize::b(self.used),
            ByteSize::b(self.total)
        )
    }
}

fn check_percent(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::MalformedResponse(format!("{what} {value}")))
    }
}

/// Health code, derived state and active alerts
pub async fn health<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<(i64, HealthState, Alerts)> {
    let host = host.as_str();
    let (state_code, errors, warnings, notices) = futures_util::try_join!(
        monitor.get_overall_state(host),
        monitor.get_errors(host),
        monitor.get_warnings(host),
        monitor.get_notices(host),
    )?;
    Ok((
        state_code,
        classify_health(state_code),
        Alerts {
            errors,
            warnings,
            notices,
        },
    ))
}

/// Current CPU load, core count and speed
pub async fn cpu_snapshot<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<CpuSnapshot> {
    let host = host.as_str();
    let (load, cores, speed) = futures_util::try_join!(
        monitor.get_cpu_load(host),
        monitor.get_cpu_cores(host),
        monitor.get_cpu_speed(host),
    )?;
    CpuSnapshot::new(load, cores, speed)
}

/// Current memory total and usage
pub async fn memory_snapshot<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<MemorySnapshot> {
    let host = host.as_str();
    let (total, usage) = futures_util::try_join!(
        monitor.get_total_memory(host),
        monitor.get_mem_usage(host),
    )?;
    MemorySnapshot::new(total, usage)
}

/// Build the summary of one host. Fails as a whole if any value can not be fetched.
#[tracing::instrument(skip_all, fields(host = %host))]
pub async fn host_summary<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<HostSummary> {
    let ((state_code, health, alerts), cpu, memory) = futures_util::try_join!(
        health(monitor, host),
        cpu_snapshot(monitor, host),
        memory_snapshot(monitor, host),
    )?;

    tracing::debug!("health {}, cpu {}, memory {}", health, cpu.class, memory.class);

    Ok(HostSummary {
        host: host.clone(),
        state_code,
        health,
        alerts,
        cpu,
        memory,
    })
}

/// Summary, partitions and network aggregate of one host, fetched concurrently.
/// Fails as a whole if any part can not be fetched.
#[tracing::instrument(skip_all, fields(host = %host))]
pub async fn host_overview<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<HostOverview> {
    let (summary, partitions, network) = futures_util::try_join!(
        host_summary(monitor, host),
        partitions(monitor, host),
        network_report(monitor, host, &InterfaceFilter::All),
    )?;

    Ok(HostOverview {
        summary,
        partitions,
        network_total: network.total.unwrap_or_default(),
    })
}

/// Usage of every monitored partition, in the monitoring service's order
#[tracing::instrument(skip_all, fields(host = %host))]
pub async fn partitions<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
) -> Result<Vec<PartitionStat>> {
    let names = monitor.get_monitored_partitions(host.as_str()).await?;
    let usage = futures_util::future::try_join_all(
        names
            .iter()
            .map(|name| monitor.get_partition_stats(host.as_str(), name)),
    )
    .await?;

    names
        .iter()
        .zip(usage)
        .map(|(name, usage)| PartitionStat::new(name, usage))
        .collect()
}
