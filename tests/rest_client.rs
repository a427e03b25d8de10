use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use host_telemetry::detail::{disk_stats, host_detail, network_stats};
use host_telemetry::fleet::FleetAggregator;
use host_telemetry::metrics::MetricsClient;
use host_telemetry::monitoring::MonitoringClient;
use host_telemetry::network::InterfaceFilter;
use host_telemetry::{ClientBuilder, Error, HostId, UtilizationClass};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type RequestLog = Arc<Mutex<Vec<String>>>;

#[derive(Clone)]
struct Canned {
    routes: Arc<HashMap<String, serde_json::Value>>,
    log: RequestLog,
}

/// Answers with the canned body for the request target, 401 without the
/// bearer token and 404 for anything else.
async fn canned(
    State(canned): State<Canned>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    uri: Uri,
) -> Response {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    canned.log.lock().unwrap().push(target.clone());

    let authorized = auth.is_some_and(|TypedHeader(auth)| auth.token() == "sesame");
    match canned.routes.get(&target) {
        Some(_) if !authorized => StatusCode::UNAUTHORIZED.into_response(),
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Spawns the canned service on a random local port.
/// Returns the base URL and the request log.
async fn serve(routes: &[(&str, &str)]) -> anyhow::Result<(String, RequestLog)> {
    let routes = routes
        .iter()
        .map(|(target, body)| {
            let body: serde_json::Value = serde_json::from_str(body)?;
            Ok(((*target).to_string(), body))
        })
        .collect::<anyhow::Result<HashMap<_, _>>>()?;
    let log = RequestLog::default();

    let app = Router::new().fallback(canned).with_state(Canned {
        routes: Arc::new(routes),
        log: log.clone(),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((format!("http://{addr}/api/"), log))
}

fn host_routes(host: &str, cpu_load: &str) -> Vec<(String, String)> {
    let p = |s: &str| format!("/api/v1/hosts/{host}/{s}");
    vec![
        (p("state"), r#"{"value":1}"#.into()),
        (p("alerts/errors"), r#"{"items":[]}"#.into()),
        (p("alerts/warnings"), r#"{"items":["swap in use"]}"#.into()),
        (p("alerts/notices"), r#"{"items":[]}"#.into()),
        (p("cpu/load"), format!(r#"{{"value":{cpu_load}}}"#)),
        (p("cpu/cores"), r#"{"value":8}"#.into()),
        (p("cpu/speed"), r#"{"value":3200.0}"#.into()),
        (p("memory/total"), r#"{"value":0}"#.into()),
        (p("memory/usage"), r#"{"value":70.0}"#.into()),
        (p("partitions"), r#"{"items":["/"]}"#.into()),
        (p("partitions/%2F"), r#"{"total":1000,"used":250}"#.into()),
        (p("interfaces"), r#"{"items":["eth0","eth1"]}"#.into()),
        (
            p("interfaces/eth0"),
            r#"{"bandwidth":100,"rx":5,"tx":6,"used":50.0}"#.into(),
        ),
        (
            p("interfaces/eth1"),
            r#"{"bandwidth":50,"rx":7,"tx":8,"used":80.0}"#.into(),
        ),
        (
            format!("/api/v1/graphs/{host}/cpu"),
            concat!(
                r#"{"title":"cpu","series":[{"name":"all","#,
                r#""points":[{"time":"2024-05-01T10:00:00Z","value":3.5}]}]}"#
            )
            .into(),
        ),
        (
            format!("/api/v1/graphs/{host}/cpu?core=1"),
            r#"{"title":"core 1","series":[]}"#.into(),
        ),
        (
            format!("/api/v1/graphs/{host}/memory"),
            r#"{"title":"memory"}"#.into(),
        ),
        (
            format!("/api/v1/graphs/{host}/network"),
            r#"{"title":"network"}"#.into(),
        ),
        (
            format!("/api/v1/graphs/{host}/network?interface=eth1"),
            r#"{"title":"eth1"}"#.into(),
        ),
    ]
}

async fn fixture() -> anyhow::Result<(host_telemetry::Client, RequestLog)> {
    let mut routes = host_routes("10.0.0.2", "12.5");
    routes.extend(host_routes("10.0.0.9", "95"));
    routes.push((
        "/api/v1/hosts/10.0.0.5/state".into(),
        r#"{"state":"broken"}"#.into(),
    ));
    let routes: Vec<(&str, &str)> = routes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let (url, log) = serve(&routes).await?;
    let client = ClientBuilder::new()
        .bearer_token("sesame")
        .timeout(std::time::Duration::from_secs(5))
        .connect(&url)?;
    Ok((client, log))
}

#[tokio::test]
async fn monitoring_calls() -> anyhow::Result<()> {
    let (client, log) = fixture().await?;

    assert_eq!(client.get_overall_state("10.0.0.2").await?, 1);
    assert_eq!(client.get_warnings("10.0.0.2").await?, vec!["swap in use"]);
    assert_eq!(client.get_cpu_cores("10.0.0.2").await?, 8);
    let usage = client.get_partition_stats("10.0.0.2", "/").await?;
    assert_eq!(usage.used, 250);

    assert!(log
        .lock()
        .unwrap()
        .contains(&"/api/v1/hosts/10.0.0.2/partitions/%2F".to_string()));

    match client.get_overall_state("10.0.0.7").await {
        Err(Error::WebServer(404, _)) => {}
        other => panic!("expected 404, got {other:?}"),
    }
    match client.get_overall_state("10.0.0.5").await {
        Err(Error::Serde(_)) => {}
        other => panic!("expected a decode error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_token_is_rejected() -> anyhow::Result<()> {
    let (client, _log) = fixture().await?;
    let url = format!("{:?}", client);
    assert!(!url.contains("sesame"));

    let (base, _) = serve(&[("/api/v1/hosts/a/state", r#"{"value":1}"#)]).await?;
    let anonymous = ClientBuilder::new().connect(&base)?;
    match anonymous.get_overall_state("a").await {
        Err(Error::WebServer(401, _)) => {}
        other => panic!("expected 401, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn graphs() -> anyhow::Result<()> {
    let (client, _log) = fixture().await?;

    let cpu = client.get_cpu_graph("10.0.0.2", None).await?;
    assert_eq!(cpu.series[0].points[0].value, 3.5);
    let core = client.get_cpu_graph("10.0.0.2", Some(1)).await?;
    assert_eq!(core.title.as_deref(), Some("core 1"));
    let net = client.get_network_graph("10.0.0.2", Some("eth1")).await?;
    assert_eq!(net.title.as_deref(), Some("eth1"));
    Ok(())
}

#[tokio::test]
async fn fleet_over_http() -> anyhow::Result<()> {
    let (client, _log) = fixture().await?;

    let hosts: Vec<HostId> = ["10.0.0.9", "10.0.0.5", "10.0.0.2"]
        .iter()
        .map(|h| h.parse())
        .collect::<Result<_, _>>()?;
    let report = FleetAggregator::new(&client).run(hosts).await;

    let order: Vec<&str> = report.entries.iter().map(|e| e.host.as_str()).collect();
    assert_eq!(order, vec!["10.0.0.2", "10.0.0.5", "10.0.0.9"]);
    assert!(report.entries[0].is_available());
    assert!(!report.entries[1].is_available());

    let busy = report.entries[2].overview().expect("10.0.0.9 overview");
    assert_eq!(busy.summary.cpu.class, UtilizationClass::Critical);
    assert_eq!(busy.summary.memory.used_bytes, 0.0);
    assert_eq!(busy.partitions[0].used_percent, 25.0);
    assert_eq!(busy.network_total.used_percent, 60.0);
    Ok(())
}

#[tokio::test]
async fn detail_over_http() -> anyhow::Result<()> {
    let (client, _log) = fixture().await?;
    let host: HostId = "10.0.0.2".parse()?;

    let detail = host_detail(&client, &client, &host).await?;
    assert_eq!(detail.partitions[0].name, "/");
    assert_eq!(detail.network_total.used_percent, 60.0);
    assert_eq!(detail.network_total.class, UtilizationClass::Normal);
    assert_eq!(detail.graphs.memory.title.as_deref(), Some("memory"));

    let eth1 = InterfaceFilter::Only("eth1".into());
    let view = network_stats(&client, &client, &host, &eth1).await?;
    assert_eq!(view.graph.title.as_deref(), Some("eth1"));
    assert_eq!(view.stats.interfaces.len(), 1);
    assert_eq!(view.stats.interfaces[0].class, UtilizationClass::Warning);

    let disks = disk_stats(&client, &host).await?;
    assert_eq!(disks.len(), 1);
    assert_eq!(disks[0].class, UtilizationClass::Normal);
    Ok(())
}
