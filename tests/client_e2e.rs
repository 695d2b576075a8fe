use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use obesity_predict::adapters::{start_api_server_background, PredictionClient};
use obesity_predict::client::{describe_error, run_test_cases, test_cases, OutputMode};
use obesity_predict::error::PredictError;
use obesity_predict::services::PredictionService;
use serde_json::json;

async fn spawn_server() -> SocketAddr {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/demo_xgb.json");
    let service = PredictionService::from_model_path(&path).expect("demo model should load");
    let (addr, _handle) = start_api_server_background(Arc::new(service), "127.0.0.1", 0)
        .await
        .expect("server should bind");
    addr
}

fn client_for(addr: SocketAddr) -> PredictionClient {
    PredictionClient::new(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn welcome_round_trip() {
    let client = client_for(spawn_server().await);
    let message = client.welcome().await.unwrap();
    assert_eq!(message, "Welcome to the Obesity Prediction API");
}

#[tokio::test]
async fn form_submissions_render_labels() {
    let client = client_for(spawn_server().await);
    let cases = test_cases();

    let first = client.predict_label(&cases[0].request).await.unwrap();
    assert_eq!(first.class_index, 4);
    assert_eq!(first.label, "Obesity Type III");

    let second = client.predict_label(&cases[1].request).await.unwrap();
    assert_eq!(second.class_index, 0);
    assert_eq!(second.label, "Insufficient Weight");
}

#[tokio::test]
async fn server_rejections_surface_status_and_detail() {
    let client = client_for(spawn_server().await);

    let mut body = serde_json::to_value(&test_cases()[0].request).unwrap();
    body["Age"] = json!(3);

    let err = client.predict(&body).await.unwrap_err();
    match &err {
        PredictError::Api { status, detail } => {
            assert_eq!(*status, 422);
            assert!(detail.contains("Age"), "detail should name the field: {detail}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(describe_error("form submission", &err).starts_with("Error 422: "));
}

#[tokio::test]
async fn test_cases_run_against_live_server() {
    let client = client_for(spawn_server().await);
    let outcomes = run_test_cases(&client, OutputMode::Json).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].title, "Test Case 1");
    let labels: Vec<&str> = outcomes
        .iter()
        .map(|o| o.result.as_ref().unwrap().label)
        .collect();
    assert_eq!(labels, vec!["Obesity Type III", "Insufficient Weight"]);
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    // Bind then drop to get a port nothing listens on
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr);

    let err = client.predict(&test_cases()[0].request).await.unwrap_err();
    assert!(err.is_connection_error());
    assert!(describe_error("form submission", &err).starts_with("Error connecting to API"));

    // Every test case still gets an outcome
    let outcomes = run_test_cases(&client, OutputMode::Json).await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.result.is_err()));
}
