//! Output formatting for client commands.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::adapters::LabeledPrediction;
use crate::domain::{FeatureValue, PredictionRequest};

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct PayloadRow {
    #[tabled(rename = "Field")]
    pub field: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// One row per field, in training column order.
pub fn payload_rows(request: &PredictionRequest) -> Vec<PayloadRow> {
    request
        .ordered_values()
        .into_iter()
        .map(|(field, value)| PayloadRow {
            field,
            value: match value {
                FeatureValue::Numeric(v) => v.to_string(),
                FeatureValue::Category(c) => c.to_string(),
            },
        })
        .collect()
}

/// Print a request payload as a field/value table, or as JSON.
pub fn print_payload(request: &PredictionRequest, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => {
            let table = Table::new(payload_rows(request)).to_string();
            println!("{table}");
        }
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(request)?);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct PredictionOutput<'a> {
    prediction: i64,
    label: &'a str,
}

/// Print the decoded prediction.
pub fn print_prediction(prediction: &LabeledPrediction, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => print_success(&format!(
            "Your predicted obesity category is: {}",
            prediction.label
        )),
        OutputMode::Json => {
            let out = PredictionOutput {
                prediction: prediction.class_index,
                label: prediction.label,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

/// Print a section heading.
pub fn print_heading(msg: &str) {
    println!("\x1b[36m{msg}\x1b[0m");
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("\x1b[32m{msg}\x1b[0m");
}

/// Print a warning message.
pub fn print_warn(msg: &str) {
    println!("\x1b[33m{msg}\x1b[0m");
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m{msg}\x1b[0m");
}
