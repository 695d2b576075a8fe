//! Interactive client: the survey form, canned test cases and output helpers.

pub mod form;
pub mod output;
pub mod test_cases;

pub use form::{collect_request, run_form, FieldKind, FieldSpec, LineSource, FORM_FIELDS};
pub use output::OutputMode;
pub use test_cases::{describe_error, run_test_cases, test_cases, TestCase, TestCaseOutcome};
