//! End-to-end balancing behavior through a live proxy.

use std::time::Duration;

mod common;

#[tokio::test]
async fn test_round_robin_distributes_across_backends() {
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::start_mock_backend("b2").await;

    let config = common::proxy_config("round_robin", &[b1, b2]);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::http_client();
    let mut b1_hits = 0;
    let mut b2_hits = 0;
    for _ in 0..10 {
        let body = client
            .get(format!("http://{}/", proxy))
            .send()
            .await
            .expect("Proxy unreachable")
            .text()
            .await
            .unwrap();
        match body.as_str() {
            "b1" => b1_hits += 1,
            "b2" => b2_hits += 1,
            other => panic!("unexpected body {:?}", other),
        }
    }
    assert_eq!(b1_hits, 5, "round robin should split traffic evenly");
    assert_eq!(b2_hits, 5);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_body_and_status_relayed() {
    let backend = common::start_programmable_backend(|| async { (404, "missing".into()) }).await;

    let config = common::proxy_config("round_robin", &[backend]);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::http_client();
    let res = client
        .post(format!("http://{}/some/path", proxy))
        .body("payload")
        .send()
        .await
        .unwrap();

    // Backend status and body pass through unmodified; 404 is not an error.
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "missing");

    shutdown.trigger();
}

#[tokio::test]
async fn test_stats_endpoint_reports_outcomes() {
    let ok = common::start_mock_backend("ok").await;
    let failing = common::start_programmable_backend(|| async { (500, "boom".into()) }).await;

    let config = common::proxy_config("round_robin", &[ok, failing]);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::http_client();
    for _ in 0..4 {
        let _ = client.get(format!("http://{}/", proxy)).send().await.unwrap();
    }

    let stats: serde_json::Value = client
        .get(format!("http://{}/lb/stats", proxy))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats["request_count"], 4);
    // Two of four requests hit the 500 backend.
    assert_eq!(stats["error_count"], 2);
    assert!((stats["error_rate"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    assert!(stats["avg_response_time"].as_f64().unwrap() > 0.0);
    assert!(stats["uptime"].as_f64().unwrap() > 0.0);
    assert_eq!(stats["total_servers"], 2);
    // A 5xx response never demotes health by itself.
    assert_eq!(stats["healthy_servers"], 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_least_response_time_prefers_faster_backend() {
    let fast = common::start_mock_backend("fast").await;
    let slow = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        (200, "slow".into())
    })
    .await;

    let mut config = common::proxy_config("least_response_time", &[fast, slow]);
    // Let probes seed both response-time windows so neither backend is
    // starved for lack of data.
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::http_client();
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Once both windows hold samples, the fast backend wins every time.
    for _ in 0..5 {
        let body = client
            .get(format!("http://{}/", proxy))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "fast");
    }

    shutdown.trigger();
}
