//! Canned payloads for manual smoke-testing a running service.

use crate::adapters::{LabeledPrediction, PredictionClient};
use crate::domain::{
    AlcoholFrequency, Gender, PredictionRequest, SnackFrequency, Transport, YesNo,
};
use crate::error::PredictError;

use super::output::{self, OutputMode};

#[derive(Debug, Clone)]
pub struct TestCase {
    pub title: &'static str,
    pub request: PredictionRequest,
}

#[derive(Debug)]
pub struct TestCaseOutcome {
    pub title: &'static str,
    pub result: std::result::Result<LabeledPrediction, PredictError>,
}

pub fn test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            title: "Test Case 1",
            request: PredictionRequest {
                gender: Gender::Male,
                age: 31,
                height: 1.87,
                weight: 128.87,
                family_history_with_overweight: YesNo::Yes,
                favc: YesNo::Yes,
                fcvc: 2.96,
                ncp: 3.00,
                caec: SnackFrequency::Sometimes,
                smoke: YesNo::Yes,
                ch2o: 1.28,
                scc: YesNo::No,
                faf: 0.90,
                tue: 1.875,
                calc: AlcoholFrequency::Sometimes,
                mtrans: Transport::Automobile,
            },
        },
        TestCase {
            title: "Test Case 2",
            request: PredictionRequest {
                gender: Gender::Female,
                age: 18,
                height: 1.59,
                weight: 40.00,
                family_history_with_overweight: YesNo::Yes,
                favc: YesNo::Yes,
                fcvc: 2.00,
                ncp: 1.00,
                caec: SnackFrequency::Frequently,
                smoke: YesNo::No,
                ch2o: 1.00,
                scc: YesNo::No,
                faf: 0.00,
                tue: 2.000,
                calc: AlcoholFrequency::No,
                mtrans: Transport::PublicTransportation,
            },
        },
    ]
}

/// Submit every canned payload through the normal request path.
///
/// A failing case is reported and the next one still runs.
pub async fn run_test_cases(client: &PredictionClient, mode: OutputMode) -> Vec<TestCaseOutcome> {
    let mut outcomes = Vec::new();

    if mode == OutputMode::Table {
        output::print_heading("Test Case Results");
    }

    for case in test_cases() {
        if mode == OutputMode::Table {
            println!();
            output::print_heading(case.title);
            if let Err(e) = output::print_payload(&case.request, mode) {
                output::print_error(&format!("Failed to render payload: {e}"));
            }
        }

        let result = client.predict_label(&case.request).await;
        match (&result, mode) {
            (Ok(prediction), OutputMode::Table) => {
                output::print_success(&format!("Prediction: {}", prediction.label));
            }
            (Ok(prediction), OutputMode::Json) => {
                let line = serde_json::json!({
                    "title": case.title,
                    "payload": case.request,
                    "prediction": prediction.class_index,
                    "label": prediction.label,
                });
                println!("{line}");
            }
            (Err(e), _) => output::print_error(&describe_error(case.title, e)),
        }

        outcomes.push(TestCaseOutcome {
            title: case.title,
            result,
        });
    }

    outcomes
}

/// Render a client error the way the form shows it.
pub fn describe_error(context: &str, err: &PredictError) -> String {
    match err {
        PredictError::Api { status, detail } => format!("Error {status}: {detail}"),
        e if e.is_connection_error() => format!("Error connecting to API: {e}"),
        e => format!("Error in {context}: {e}"),
    }
}
