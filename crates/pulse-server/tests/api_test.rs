//! HTTP surface tests driven through `tower::ServiceExt::oneshot`.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use pulse_hardware::{
    AcquisitionPlan, HardwareError, OpticalSensor, SimulatedBuzzer, SimulatedEnvironment,
    SimulatedOximeter, UnavailableDevice,
};
use pulse_server::api::{create_router, AppState};
use pulse_server::{BusyPolicy, HardwareContext, MonitorConfig, SensorSource, VitalsMonitor};

fn config() -> MonitorConfig {
    let mut cfg = MonitorConfig::default();
    cfg.acquisition.plan = AcquisitionPlan::Count {
        samples: 20,
        interval_ms: 0,
        settle_ms: 0,
    };
    cfg
}

fn simulated_hardware(optical: Box<dyn OpticalSensor>) -> HardwareContext {
    HardwareContext::new(
        optical,
        Box::new(SimulatedEnvironment::new(7).with_baseline(36.8, 40.0)),
        Box::new(SimulatedBuzzer::new()),
        SensorSource::Simulated,
    )
}

fn app_with(hw: HardwareContext, busy: BusyPolicy) -> (Router, Arc<VitalsMonitor>) {
    let monitor = Arc::new(VitalsMonitor::new(hw, &config()));
    let app = create_router(AppState::new(Arc::clone(&monitor), busy), None);
    (app, monitor)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn api_data_returns_snapshot_fields() {
    let (app, _) = app_with(
        simulated_hardware(Box::new(SimulatedOximeter::new(1))),
        BusyPolicy::Queue,
    );
    let (status, json) = get_json(app, "/api/data").await;

    assert_eq!(status, StatusCode::OK);
    for key in ["spo2", "frecuencia", "temperatura", "humedad", "edad", "ejercicio", "alerta"] {
        assert!(json.get(key).is_some(), "missing {key} in {json}");
    }
    assert_eq!(json["edad"], 25);
    assert_eq!(json["ejercicio"], "no");
    let spo2 = json["spo2"].as_f64().unwrap();
    assert!((85.0..=100.0).contains(&spo2), "spo2 {spo2}");
}

#[tokio::test]
async fn sensor_failure_serves_fail_safe_json() {
    let (app, monitor) = app_with(
        simulated_hardware(Box::new(UnavailableDevice::new("MAX30100", "no ACK"))),
        BusyPolicy::Queue,
    );
    let (status, json) = get_json(app, "/api/data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["spo2"], 0.0);
    assert_eq!(json["frecuencia"], 0.0);
    assert_eq!(json["temperatura"], 0.0);
    assert_eq!(json["humedad"], 0.0);
    assert_eq!(json["edad"], 25);
    assert_eq!(json["ejercicio"], "no");
    assert_eq!(json["alerta"], true);
    assert_eq!(monitor.stats().failures, 1);
}

#[tokio::test]
async fn index_renders_html() {
    let (app, _) = app_with(
        simulated_hardware(Box::new(SimulatedOximeter::new(2))),
        BusyPolicy::Queue,
    );
    let (status, body) = get(app, "/").await;
    let html = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Monitor de signos vitales"));
    assert!(html.contains("Edad: 25"));
}

#[tokio::test]
async fn health_reports_source_and_counters() {
    let (app, _) = app_with(
        simulated_hardware(Box::new(SimulatedOximeter::new(3))),
        BusyPolicy::Reject,
    );
    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["source"], "simulated");
    assert_eq!(json["strategy"], "ratio");
    assert_eq!(json["alert_policy"], "tight");
    assert_eq!(json["busy_policy"], "reject");
    assert_eq!(json["cycles"], 0);
}

/// Oximeter whose `enable` waits for the test to release it.
struct Gated {
    release: mpsc::Receiver<()>,
    inner: SimulatedOximeter,
}

impl OpticalSensor for Gated {
    fn enable(&mut self) -> Result<(), HardwareError> {
        let _ = self.release.recv_timeout(Duration::from_secs(5));
        self.inner.enable()
    }
    fn read_one(&mut self) -> Result<(u32, u32), HardwareError> {
        self.inner.read_one()
    }
    fn shutdown(&mut self) -> Result<(), HardwareError> {
        self.inner.shutdown()
    }
}

#[tokio::test]
async fn busy_request_is_rejected_with_503() {
    let (tx, rx) = mpsc::channel();
    let (app, monitor) = app_with(
        simulated_hardware(Box::new(Gated {
            release: rx,
            inner: SimulatedOximeter::new(4),
        })),
        BusyPolicy::Reject,
    );

    let first = tokio::spawn(get_json(app.clone(), "/api/data"));
    while !monitor.stats().in_flight {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let (status, json) = get_json(app, "/api/data").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "BUSY");

    tx.send(()).unwrap();
    let (status, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _) = app_with(
        simulated_hardware(Box::new(SimulatedOximeter::new(5))),
        BusyPolicy::Queue,
    );
    let (status, _) = get(app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
