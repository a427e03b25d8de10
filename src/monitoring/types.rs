//!
//! Payloads returned by the monitoring service.
//!

/// Single scalar answer
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Value<T> {
    pub value: T,
}

/// List answer, e.g. alert messages or monitored interfaces
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Items {
    pub items: Vec<String>,
}

/// Partition usage
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionUsage {
    /// Capacity in bytes
    pub total: u64,
    /// Used bytes
    pub used: u64,
}

/// Network interface counters
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceCounters {
    /// Link capacity
    pub bandwidth: u64,
    /// Received bytes
    pub rx: u64,
    /// Transmitted bytes
    pub tx: u64,
    /// Percentage of the capacity in use
    pub used: f64,
}
