//!
//! Optional module for building a client from the environment

use std::time::Duration;

/// Build a client from environment variables
/// * `MONITOR_URL` - monitoring service, typically `https://monitor:8443`
/// * `METRICS_URL` - metrics service, defaults to `MONITOR_URL`
/// * `MONITOR_TOKEN` - bearer token sent with every request
/// * `MONITOR_CA` - path to a PEM encoded CA certificate
/// * `MONITOR_INSECURE` - set to `1` or `true` to skip certificate verification
/// * `MONITOR_TIMEOUT_SECS` - HTTP request timeout in seconds
///
/// **NOTE** `MONITOR_INSECURE` should not be used in production but only for local testing.
///
pub async fn client_from_env() -> crate::Result<crate::Client> {
    let monitor_url = std::env::var("MONITOR_URL")
        .map_err(|_| crate::Error::MissingEnv("MONITOR_URL".into()))?;
    tracing::info!("Monitoring service at {}", monitor_url);

    let mut builder = crate::ClientBuilder::new();

    if let Ok(metrics_url) = std::env::var("METRICS_URL") {
        tracing::info!("Metrics service at {}", metrics_url);
        builder = builder.metrics_url(&metrics_url)?;
    }

    if let Ok(token) = std::env::var("MONITOR_TOKEN") {
        builder = builder.bearer_token(&token);
    }

    if let Ok(ca_path) = std::env::var("MONITOR_CA") {
        let ca = tokio::fs::read(&ca_path).await?;
        builder = builder.add_root_certificate(&ca)?;
    }

    if std::env::var("MONITOR_INSECURE").map_or(false, |v| is_truthy(&v)) {
        tracing::warn!("Certificate verification disabled");
        builder = builder.danger_accept_invalid_certs();
    }

    if let Ok(secs) = std::env::var("MONITOR_TIMEOUT_SECS") {
        builder = builder.timeout(parse_timeout(&secs)?);
    }

    builder.connect(&monitor_url)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_timeout(secs: &str) -> crate::Result<Duration> {
    secs.trim()
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| crate::Error::InvalidInput(format!("MONITOR_TIMEOUT_SECS={secs}")))
}
