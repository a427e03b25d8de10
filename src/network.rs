//!
//! Per-interface network statistics and the cross-interface aggregate.
//!
use crate::classify::{classify, UtilizationClass};
use crate::monitoring::{InterfaceCounters, MonitoringClient};
use crate::{Error, HostId, Result};
use serde::Serialize;

/// Which interface rows a network query returns
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InterfaceFilter {
    /// Every interface, followed by the aggregate
    #[default]
    All,
    /// Only the named interface, without the aggregate
    Only(String),
}

impl InterfaceFilter {
    /// Returns true if rows for `interface` should be kept
    #[must_use]
    pub fn includes(&self, interface: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == interface,
        }
    }

    /// The aggregate row is only produced for [`InterfaceFilter::All`]
    #[must_use]
    pub const fn wants_total(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Interface name to pass on to single-interface queries
    #[must_use]
    pub fn interface(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(name) => Some(name),
        }
    }
}

/// `"all"`, in any case, selects every interface; anything else names one.
impl std::str::FromStr for InterfaceFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.to_string()))
        }
    }
}

impl From<Option<&str>> for InterfaceFilter {
    fn from(interface: Option<&str>) -> Self {
        interface.map_or(Self::All, |name| Self::Only(name.to_string()))
    }
}

/// Statistics of one network interface
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceStat {
    pub name: String,
    /// Link capacity
    pub bandwidth: u64,
    /// Received bytes
    pub rx: u64,
    /// Transmitted bytes
    pub tx: u64,
    /// Percentage of the capacity in use
    pub used_percent: f64,
    pub class: UtilizationClass,
}

impl InterfaceStat {
    /// Build from raw counters. The usage must be a finite, non-negative percentage.
    pub fn new(name: &str, counters: InterfaceCounters) -> Result<Self> {
        if !counters.used.is_finite() || counters.used < 0.0 {
            return Err(Error::MalformedResponse(format!(
                "interface {name} reports usage {}",
                counters.used
            )));
        }
        Ok(Self {
            name: name.to_string(),
            bandwidth: counters.bandwidth,
            rx: counters.rx,
            tx: counters.tx,
            used_percent: counters.used,
            class: classify(counters.used),
        })
    }

    /// Share of the bandwidth in use, in bandwidth units
    #[allow(clippy::cast_precision_loss)]
    fn weighted_used(&self) -> f64 {
        self.used_percent / 100.0 * self.bandwidth as f64
    }
}

/// Totals across all interfaces of a host
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceAggregate {
    pub bandwidth: u64,
    pub rx: u64,
    pub tx: u64,
    /// Bandwidth weighted usage, rounded to a whole percent
    pub used_percent: f64,
    pub class: UtilizationClass,
}

impl InterfaceAggregate {
    /// Aggregate a set of interfaces. The result does not depend on the order.
    ///
    /// Fails if the summed counters do not fit in 64 bits.
    pub fn from_interfaces<'a>(
        interfaces: impl IntoIterator<Item = &'a InterfaceStat>,
    ) -> Result<Self> {
        let mut totals = Totals::default();
        for stat in interfaces {
            totals.add(stat)?;
        }
        Ok(totals.finish())
    }
}

impl Default for InterfaceAggregate {
    fn default() -> Self {
        Totals::default().finish()
    }
}

/// Running sums, turned into a ratio only once every interface is in
#[derive(Default)]
struct Totals {
    bandwidth: u64,
    rx: u64,
    tx: u64,
    weighted_used: f64,
}

impl Totals {
    fn add(&mut self, stat: &InterfaceStat) -> Result<()> {
        let overflow = |counter: &str| {
            Error::MalformedResponse(format!(
                "{counter} total overflows at interface {}",
                stat.name
            ))
        };
        self.bandwidth = self
            .bandwidth
            .checked_add(stat.bandwidth)
            .ok_or_else(|| overflow("bandwidth"))?;
        self.rx = self.rx.checked_add(stat.rx).ok_or_else(|| overflow("rx"))?;
        self.tx = self.tx.checked_add(stat.tx).ok_or_else(|| overflow("tx"))?;
        self.weighted_used += stat.weighted_used();
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> InterfaceAggregate {
        // no bandwidth means nothing can be in use
        let used_percent = if self.bandwidth == 0 {
            0.0
        } else {
            (self.weighted_used / self.bandwidth as f64 * 100.0).round()
        };
        InterfaceAggregate {
            bandwidth: self.bandwidth,
            rx: self.rx,
            tx: self.tx,
            used_percent,
            class: classify(used_percent),
        }
    }
}

/// Interface rows matching the filter, plus the aggregate when every
/// interface was asked for
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkReport {
    pub interfaces: Vec<InterfaceStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<InterfaceAggregate>,
}

/// Collect interface statistics of `host`.
///
/// Totals always cover every monitored interface, also when the rows are
/// filtered down to a single one.
#[tracing::instrument(skip_all, fields(host = %host))]
pub async fn network_report<M: MonitoringClient + ?Sized>(
    monitor: &M,
    host: &HostId,
    filter: &InterfaceFilter,
) -> Result<NetworkReport> {
    let names = monitor.get_monitored_interfaces(host.as_str()).await?;

    let counters = futures_util::future::try_join_all(
        names
            .iter()
            .map(|name| monitor.get_interface_stats(host.as_str(), name)),
    )
    .await?;

    let mut totals = Totals::default();
    let mut interfaces = Vec::new();
    for (name, counters) in names.iter().zip(counters) {
        let stat = InterfaceStat::new(name, counters)?;
        totals.add(&stat)?;
        if filter.includes(name) {
            interfaces.push(stat);
        }
    }

    tracing::debug!("{} of {} interfaces selected", interfaces.len(), names.len());

    Ok(NetworkReport {
        interfaces,
        total: filter.wants_total().then(|| totals.finish()),
    })
}
