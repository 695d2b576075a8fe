//! Interactive survey form.
//!
//! One prompt per request field, constrained the way the web form was:
//! choice lists, integer steppers and bounded sliders. Constraints here are a
//! UI affordance; the service runs its own validation.

use serde_json::{Map, Value};

use crate::adapters::PredictionClient;
use crate::domain::{
    AlcoholFrequency, Gender, PredictionRequest, SnackFrequency, Transport, YesNo,
};
use crate::error::{PredictError, Result};

use super::output::{self, OutputMode};
use super::test_cases::{describe_error, run_test_cases};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Choice(&'static [&'static str]),
    Integer { min: i64, max: i64 },
    Float { min: f64, max: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Wire name in the request payload
    pub key: &'static str,
    pub prompt: &'static str,
    pub kind: FieldKind,
}

pub const FORM_FIELDS: [FieldSpec; 16] = [
    FieldSpec {
        key: "Gender",
        prompt: "Gender",
        kind: FieldKind::Choice(Gender::CHOICES),
    },
    FieldSpec {
        key: "Age",
        prompt: "Age",
        kind: FieldKind::Integer { min: 15, max: 100 },
    },
    FieldSpec {
        key: "Height",
        prompt: "Height (m)",
        kind: FieldKind::Float { min: 1.0, max: None },
    },
    FieldSpec {
        key: "Weight",
        prompt: "Weight (kg)",
        kind: FieldKind::Float { min: 20.0, max: None },
    },
    FieldSpec {
        key: "family_history_with_overweight",
        prompt: "Do you have a family history of overweight or obesity?",
        kind: FieldKind::Choice(YesNo::CHOICES),
    },
    FieldSpec {
        key: "FAVC",
        prompt: "Do you eat high calorie food frequently?",
        kind: FieldKind::Choice(YesNo::CHOICES),
    },
    FieldSpec {
        key: "FCVC",
        prompt: "On a scale of 1 to 3, how frequently do you consume vegetables?",
        kind: FieldKind::Float { min: 1.0, max: Some(3.0) },
    },
    FieldSpec {
        key: "NCP",
        prompt: "How many main meals do you typically consume per day?",
        kind: FieldKind::Integer { min: 1, max: 4 },
    },
    FieldSpec {
        key: "CAEC",
        prompt: "How often do you eat food between main meals?",
        kind: FieldKind::Choice(SnackFrequency::CHOICES),
    },
    FieldSpec {
        key: "SMOKE",
        prompt: "Do you smoke?",
        kind: FieldKind::Choice(YesNo::CHOICES),
    },
    FieldSpec {
        key: "CH2O",
        prompt: "On a scale of 1 to 3, how would you describe your average daily water intake?",
        kind: FieldKind::Float { min: 1.0, max: Some(3.0) },
    },
    FieldSpec {
        key: "SCC",
        prompt: "Do you monitor your calorie intake?",
        kind: FieldKind::Choice(YesNo::CHOICES),
    },
    FieldSpec {
        key: "FAF",
        prompt: "On a scale of 0 to 3, how often do you engage in physical activity?",
        kind: FieldKind::Float { min: 0.0, max: Some(3.0) },
    },
    FieldSpec {
        key: "TUE",
        prompt: "On a scale of 0 to 2, how much time do you spend daily using technology devices?",
        kind: FieldKind::Float { min: 0.0, max: Some(2.0) },
    },
    FieldSpec {
        key: "CALC",
        prompt: "How often do you consume alcohol?",
        kind: FieldKind::Choice(AlcoholFrequency::CHOICES),
    },
    FieldSpec {
        key: "MTRANS",
        prompt: "What is your primary mode of transportation?",
        kind: FieldKind::Choice(Transport::CHOICES),
    },
];

impl FieldSpec {
    /// Prompt text including the accepted inputs and the default.
    pub fn render_prompt(&self) -> String {
        match self.kind {
            FieldKind::Choice(choices) => {
                let options: Vec<String> = choices
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("{}) {}", i + 1, c))
                    .collect();
                format!("{} [{}] (default {}): ", self.prompt, options.join(", "), choices[0])
            }
            FieldKind::Integer { min, max } => {
                format!("{} [{min}-{max}] (default {min}): ", self.prompt)
            }
            FieldKind::Float { min, max: Some(max) } => {
                format!("{} [{min:.1}-{max:.1}] (default {min:.1}): ", self.prompt)
            }
            FieldKind::Float { min, max: None } => {
                format!("{} [>= {min:.1}] (default {min:.1}): ", self.prompt)
            }
        }
    }

    /// Parse one line of input. Empty input takes the default (first choice
    /// or minimum).
    pub fn parse_answer(&self, input: &str) -> std::result::Result<Value, String> {
        let input = input.trim();
        match self.kind {
            FieldKind::Choice(choices) => parse_choice(input, choices).map(Value::from),
            FieldKind::Integer { min, max } => {
                if input.is_empty() {
                    return Ok(Value::from(min));
                }
                let v: i64 = input
                    .parse()
                    .map_err(|_| format!("{input:?} is not a whole number"))?;
                if v < min || v > max {
                    return Err(format!("must be between {min} and {max}"));
                }
                Ok(Value::from(v))
            }
            FieldKind::Float { min, max } => {
                if input.is_empty() {
                    return Ok(Value::from(min));
                }
                let v: f64 = input
                    .parse()
                    .map_err(|_| format!("{input:?} is not a number"))?;
                if !v.is_finite() || v < min {
                    return Err(format!("must be at least {min}"));
                }
                if let Some(max) = max {
                    if v > max {
                        return Err(format!("must be at most {max}"));
                    }
                }
                Ok(Value::from(v))
            }
        }
    }
}

/// Accept a 1-based option number or the option text (case-insensitive).
fn parse_choice(input: &str, choices: &'static [&'static str]) -> std::result::Result<&'static str, String> {
    if input.is_empty() {
        return Ok(choices[0]);
    }
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| choices.get(i))
            .copied()
            .ok_or_else(|| format!("pick a number between 1 and {}", choices.len()));
    }
    choices
        .iter()
        .find(|c| c.eq_ignore_ascii_case(input))
        .copied()
        .ok_or_else(|| format!("expected one of: {}", choices.join(", ")))
}

/// Where form answers come from. `None` means the user abandoned the form.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for rustyline::DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        use rustyline::error::ReadlineError;

        match self.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(PredictError::Internal(format!("readline error: {e}"))),
        }
    }
}

/// Ask every field in order, re-prompting on invalid input.
///
/// Returns `None` when the user cancels part way through.
pub fn collect_request<S: LineSource>(source: &mut S) -> Result<Option<PredictionRequest>> {
    let mut payload = Map::new();

    for field in FORM_FIELDS.iter() {
        let prompt = field.render_prompt();
        let value = loop {
            let Some(line) = source.read_line(&prompt)? else {
                return Ok(None);
            };
            match field.parse_answer(&line) {
                Ok(value) => break value,
                Err(msg) => output::print_warn(&format!("  {}: {msg}", field.key)),
            }
        };
        payload.insert(field.key.to_string(), value);
    }

    let request = serde_json::from_value(Value::Object(payload))?;
    Ok(Some(request))
}

/// Run the form once, submit it, then offer the canned test cases.
pub async fn run_form(client: &PredictionClient, mode: OutputMode) -> Result<()> {
    let mut editor = rustyline::DefaultEditor::new()
        .map_err(|e| PredictError::Internal(format!("failed to start line editor: {e}")))?;

    output::print_heading("Obesity Prediction");
    println!("Fill in the form below to predict your obesity level.");
    println!("Press Enter to accept a default, Ctrl+C to cancel.");
    println!();

    let Some(request) = collect_request(&mut editor)? else {
        output::print_warn("Form cancelled");
        return Ok(());
    };

    match client.predict_label(&request).await {
        Ok(prediction) => output::print_prediction(&prediction, mode)?,
        Err(e) => output::print_error(&describe_error("form submission", &e)),
    }

    println!();
    let run_tests = editor
        .read_line("Run test cases? [y/N] ")?
        .map(|answer| matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false);
    if run_tests {
        run_test_cases(client, mode).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_ORDER;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<&'static str>);

    impl LineSource for Scripted {
        fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
            Ok(self.0.pop_front().map(str::to_string))
        }
    }

    #[test]
    fn form_fields_cover_request_in_order() {
        let keys: Vec<&str> = FORM_FIELDS.iter().map(|f| f.key).collect();
        assert_eq!(keys, FEATURE_ORDER.to_vec());
    }

    #[test]
    fn parses_choice_by_number_or_text() {
        assert_eq!(parse_choice("2", Transport::CHOICES), Ok("Bike"));
        assert_eq!(
            parse_choice("public_transportation", Transport::CHOICES),
            Ok("Public_Transportation")
        );
        assert_eq!(parse_choice("", YesNo::CHOICES), Ok("yes"));
        assert!(parse_choice("0", YesNo::CHOICES).is_err());
        assert!(parse_choice("6", Transport::CHOICES).is_err());
        assert!(parse_choice("maybe", YesNo::CHOICES).is_err());
    }

    #[test]
    fn numeric_answers_respect_ui_bounds() {
        let age = FORM_FIELDS[1];
        assert_eq!(age.parse_answer("").unwrap(), Value::from(15));
        assert_eq!(age.parse_answer("42").unwrap(), Value::from(42));
        assert!(age.parse_answer("101").is_err());
        assert!(age.parse_answer("30.5").is_err());

        let tue = FORM_FIELDS[13];
        assert_eq!(tue.parse_answer("1.5").unwrap(), Value::from(1.5));
        assert!(tue.parse_answer("2.1").is_err());
        assert!(tue.parse_answer("-0.1").is_err());
        assert!(tue.parse_answer("NaN").is_err());

        let weight = FORM_FIELDS[3];
        assert_eq!(weight.parse_answer("250").unwrap(), Value::from(250.0));
    }

    #[test]
    fn collects_full_request_with_retries() {
        let mut source = Scripted(VecDeque::from(vec![
            "Female", // Gender
            "200",    // Age out of range, re-prompted
            "18",     // Age
            "1.59",   // Height
            "40",     // Weight
            "1",      // family history: yes
            "yes",    // FAVC
            "2",      // FCVC
            "1",      // NCP
            "3",      // CAEC: Frequently
            "no",     // SMOKE
            "",       // CH2O default 1.0
            "2",      // SCC: no
            "0",      // FAF
            "2",      // TUE
            "no",     // CALC
            "4",      // MTRANS: Public_Transportation
        ]));

        let request = collect_request(&mut source).unwrap().unwrap();
        let expected = crate::client::test_cases::test_cases()[1].request.clone();
        assert_eq!(request, expected);
        assert!(source.0.is_empty());
    }

    #[test]
    fn cancelled_form_returns_none() {
        let mut source = Scripted(VecDeque::from(vec!["Male", "31"]));
        assert!(collect_request(&mut source).unwrap().is_none());
    }

    #[test]
    fn prompts_show_choices_and_defaults() {
        let prompt = FORM_FIELDS[0].render_prompt();
        assert_eq!(prompt, "Gender [1) Male, 2) Female] (default Male): ");
        let prompt = FORM_FIELDS[12].render_prompt();
        assert!(prompt.contains("[0.0-3.0]"));
    }
}
