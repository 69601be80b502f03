#![allow(clippy::unwrap_used, clippy::expect_used)]

use qmatrix_core::errors::RestoreError;
use qmatrix_core::logging_facility::test_capture::init_test_capture;
use qmatrix_core::logging_facility::Profile;
use qmatrix_core::{log_op_end, log_op_error, log_op_start};
use qmatrix_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events();
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].fields.get("duration_ms"), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = RestoreError::MissingWeightRecord {
        old_id: 1,
        old_row_id: 2,
        old_col_id: 3,
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have an end_error event");

    assert_eq!(
        error_event.fields.get("err_code"),
        Some(&"ERR_MISSING_WEIGHT_RECORD".to_string())
    );
    assert!(error_event.fields.contains_key("err_kind"));
}

#[test]
fn test_profile_parse() {
    assert_eq!(Profile::parse("production"), Profile::Production);
    assert_eq!(Profile::parse("development"), Profile::Development);
    assert_eq!(Profile::parse("verbose"), Profile::Development);
}
