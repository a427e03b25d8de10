//! Print a JSON fleet overview for the hosts given on the command line.
//!
//! ```text
//! MONITOR_URL=https://monitor:8443 \
//!     cargo run --features env-config --example fleet-report -- 10.0.0.2 10.0.0.9
//! ```
use host_telemetry::fleet::{cancel_on, FleetAggregator, FleetOptions};
use host_telemetry::HostId;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let hosts = std::env::args()
        .skip(1)
        .map(|h| h.parse::<HostId>())
        .collect::<Result<Vec<_>, _>>()?;
    anyhow::ensure!(!hosts.is_empty(), "usage: fleet-report HOST...");

    let client = host_telemetry::env_config::client_from_env().await?;

    let report = FleetAggregator::new(&client)
        .with_options(FleetOptions {
            concurrency: 16,
            ..FleetOptions::default()
        })
        .run_until(hosts, cancel_on(tokio::signal::ctrl_c()))
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
