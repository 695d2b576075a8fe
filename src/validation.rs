/// Range validation for prediction requests
///
/// Type and choice-set checks already happen when the request body is
/// deserialized. This module adds the numeric domain checks that the form
/// client presents as input constraints, so the service can refuse values the
/// model never saw in training (negative ages, zero heights, sliders outside
/// their scale).
use crate::domain::{NumericBounds, PredictionRequest, NUMERIC_BOUNDS};
use crate::error::{FieldError, PredictError, Result};

/// Check a single numeric value against its domain
///
/// # Arguments
/// * `value` - Value to validate
/// * `bounds` - Allowed domain of the field
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err` with the field-level message if invalid
pub fn validate_bounds(value: f64, bounds: &NumericBounds) -> std::result::Result<(), FieldError> {
    if !value.is_finite() {
        return Err(FieldError::new(bounds.field, "must be a finite number"));
    }

    if bounds.contains(value) {
        return Ok(());
    }

    let message = match bounds.max {
        Some(max) => format!("must be within [{}, {}], got {}", bounds.min, max, value),
        None => format!("must be >= {}, got {}", bounds.min, value),
    };
    Err(FieldError::new(bounds.field, message))
}

/// Validate every bounded field of a request
///
/// All violations are collected so the caller sees the complete list in one
/// response.
///
/// # Returns
/// * `Ok(())` if every numeric field is in range
/// * `Err(PredictError::InvalidFields)` listing each offending field
pub fn validate_request(request: &PredictionRequest) -> Result<()> {
    let mut errors = Vec::new();

    for bounds in NUMERIC_BOUNDS.iter() {
        let Some(value) = request.numeric_field(bounds.field) else {
            return Err(PredictError::Internal(format!(
                "bounded field {} is not numeric",
                bounds.field
            )));
        };
        if let Err(e) = validate_bounds(value, bounds) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PredictError::InvalidFields(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlcoholFrequency, Gender, SnackFrequency, Transport, YesNo};

    fn valid_request() -> PredictionRequest {
        PredictionRequest {
            gender: Gender::Male,
            age: 31,
            height: 1.87,
            weight: 128.87,
            family_history_with_overweight: YesNo::Yes,
            favc: YesNo::Yes,
            fcvc: 2.96,
            ncp: 3.0,
            caec: SnackFrequency::Sometimes,
            smoke: YesNo::Yes,
            ch2o: 1.28,
            scc: YesNo::No,
            faf: 0.9,
            tue: 1.875,
            calc: AlcoholFrequency::Sometimes,
            mtrans: Transport::Automobile,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let mut req = valid_request();
        req.age = 15;
        req.height = 1.0;
        req.weight = 20.0;
        req.fcvc = 3.0;
        req.ncp = 4.0;
        req.ch2o = 1.0;
        req.faf = 0.0;
        req.tue = 2.0;
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let mut req = valid_request();
        req.age = -3;
        req.tue = 2.5;
        req.height = 0.5;

        match validate_request(&req) {
            Err(PredictError::InvalidFields(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["Age", "Height", "TUE"]);
                assert!(fields[0].message.contains(">= 15"));
                assert!(fields[2].message.contains("[0, 2]"));
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let bounds = NUMERIC_BOUNDS[1];
        let err = validate_bounds(f64::INFINITY, &bounds).unwrap_err();
        assert_eq!(err.field, "Height");
        assert!(err.message.contains("finite"));
    }
}
