// Integration tests for transactional backup restores

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{count, fixture, setup_test_db};
use qmatrix_core::identity::MappingKind;
use qmatrix_store::backup::parse_backup_file;
use qmatrix_store::repo::{attempt_steps_for_question, legacy_states_for_question};
use qmatrix_store::restore::{events_for_request, restore_backup_file, QuestionOutcome};
use qmatrix_store::SqliteMatrixStore;

fn mapping(report: &qmatrix_store::restore::QuestionReport, kind: MappingKind, old: i64) -> i64 {
    report
        .mappings
        .iter()
        .find(|m| m.kind == kind && m.old_id == old)
        .map(|m| m.new_id)
        .unwrap_or_else(|| panic!("no {} mapping for {}", kind, old))
}

#[test]
fn test_create_restore_persists_structure_and_answers() {
    // GIVEN an empty database and a backup for a freshly created question
    let mut conn = setup_test_db();

    // WHEN it is restored
    let report = restore_backup_file(&mut conn, &fixture("backup_create.yaml")).unwrap();

    // THEN the question is restored with fresh ids
    assert!(report.is_success());
    let question = &report.questions[0];
    let QuestionOutcome::Restored {
        summary,
        attempt_steps,
        legacy_states,
        response_failures,
        unmapped_cells,
    } = &question.outcome
    else {
        panic!("expected restored outcome, got {:?}", question.outcome);
    };
    assert!(summary.created);
    assert_eq!((summary.rows, summary.cols, summary.weights), (2, 2, 2));
    assert_eq!((*attempt_steps, *legacy_states), (2, 1));
    assert!(response_failures.is_empty());
    assert!(unmapped_cells.is_empty());

    let row_a = mapping(question, MappingKind::Row, 4);
    let row_b = mapping(question, MappingKind::Row, 5);
    let col_true = mapping(question, MappingKind::Col, 6);
    let col_false = mapping(question, MappingKind::Col, 7);

    // AND the stored matrix is owned by the destination question
    let stored = SqliteMatrixStore::new(&conn).load_matrix(500).unwrap().unwrap();
    assert_eq!(stored.matrix.question_id, 500);
    assert!(!stored.matrix.options.multiple);
    assert_eq!(stored.rows.len(), 2);
    assert_eq!(stored.weights.get(row_a, col_true), 1.0);
    assert_eq!(stored.weights.get(row_a, col_false), 0.0);
    assert_eq!(stored.weights.get(row_b, col_false), 1.0);

    // AND answers reference the new ids
    let steps = attempt_steps_for_question(&conn, 500).unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].response["_order"], format!("{},{}", row_a, row_b));
    assert_eq!(steps[1].response[&format!("cell{}", row_a)], col_true.to_string());
    assert_eq!(steps[1].response[&format!("cell{}", row_b)], col_false.to_string());
    assert_eq!(steps[1].response["-finish"], "1");

    let states = legacy_states_for_question(&conn, 500).unwrap();
    assert_eq!(
        states,
        vec![format!(
            "a:2:{{i:{};a:1:{{i:{};s:1:\"1\";}}i:{};a:1:{{i:{};s:1:\"1\";}}}}",
            row_a, col_true, row_b, col_false
        )]
    );
}

#[test]
fn test_merge_restore_reuses_existing_records() {
    // GIVEN a question already restored once
    let mut conn = setup_test_db();
    let first = restore_backup_file(&mut conn, &fixture("backup_create.yaml")).unwrap();
    let created = &first.questions[0];

    // WHEN the same content is restored onto the existing question
    let report = restore_backup_file(&mut conn, &fixture("backup_merge.yaml")).unwrap();

    // THEN nothing new is inserted
    assert!(report.is_success());
    assert_eq!(count(&conn, "question_matrix"), 1);
    assert_eq!(count(&conn, "question_matrix_rows"), 2);
    assert_eq!(count(&conn, "question_matrix_cols"), 2);
    assert_eq!(count(&conn, "question_matrix_weights"), 2);

    // AND every old id resolves to the records created the first time
    let merged = &report.questions[0];
    for (kind, old) in [
        (MappingKind::Matrix, 3),
        (MappingKind::Row, 4),
        (MappingKind::Row, 5),
        (MappingKind::Col, 6),
        (MappingKind::Col, 7),
        (MappingKind::Weight, 8),
        (MappingKind::Weight, 9),
    ] {
        assert_eq!(mapping(merged, kind, old), mapping(created, kind, old));
    }

    // AND the merged attempt is recoded against them
    let row_a = mapping(merged, MappingKind::Row, 4);
    let row_b = mapping(merged, MappingKind::Row, 5);
    let col_true = mapping(merged, MappingKind::Col, 6);
    let recoded_value: String = conn
        .query_row(
            "SELECT value FROM attempt_step_data WHERE questionid = 500 AND name = ?1
             ORDER BY id DESC LIMIT 1",
            [format!("cell{}", row_b)],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(recoded_value, col_true.to_string());
    let order: String = conn
        .query_row(
            "SELECT value FROM attempt_step_data WHERE questionid = 500 AND name = '_order'
             ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(order, format!("{},{}", row_b, row_a));
}

#[test]
fn test_failed_question_rolls_back_and_others_continue() {
    // GIVEN a backup whose first question merges into a missing matrix
    let mut conn = setup_test_db();

    // WHEN it is restored
    let report = restore_backup_file(&mut conn, &fixture("backup_partial_failure.yaml")).unwrap();

    // THEN the first question failed and left nothing behind
    assert_eq!(report.restored_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(!report.is_success());
    match &report.questions[0].outcome {
        QuestionOutcome::Failed { code, .. } => assert_eq!(code, "ERR_MISSING_MATRIX_RECORD"),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.questions[0].mappings.is_empty());
    assert!(SqliteMatrixStore::new(&conn).load_matrix(700).unwrap().is_none());

    // AND the second question restored despite bad responses
    let question = &report.questions[1];
    let QuestionOutcome::Restored {
        attempt_steps,
        legacy_states,
        response_failures,
        unmapped_cells,
        ..
    } = &question.outcome
    else {
        panic!("expected restored outcome, got {:?}", question.outcome);
    };
    assert_eq!((*attempt_steps, *legacy_states), (1, 1));
    let codes: Vec<(Option<u32>, &str)> = response_failures
        .iter()
        .map(|f| (f.sequence_number, f.code.as_str()))
        .collect();
    assert_eq!(
        codes,
        vec![
            (Some(0), "ERR_MISSING_ORDER_REFERENCE"),
            (None, "ERR_INVALID_LEGACY_STATE"),
        ]
    );
    assert_eq!(unmapped_cells.len(), 1);
    assert_eq!(unmapped_cells[0].kind, MappingKind::Col);
    assert_eq!(unmapped_cells[0].old_key, "77");

    let row = mapping(question, MappingKind::Row, 32);
    let states = legacy_states_for_question(&conn, 800).unwrap();
    assert_eq!(states, vec![format!("a:1:{{i:{};a:1:{{i:0;s:1:\"1\";}}}}", row)]);
}

#[test]
fn test_malformed_question_fails_alone() {
    // GIVEN a backup whose second question repeats a row id
    let mut conn = setup_test_db();

    // WHEN it is restored
    let report =
        restore_backup_file(&mut conn, &fixture("backup_invalid_question.yaml")).unwrap();

    // THEN the valid question is restored
    assert_eq!(report.restored_count(), 1);
    assert!(matches!(
        report.questions[0].outcome,
        QuestionOutcome::Restored { .. }
    ));
    let stored = SqliteMatrixStore::new(&conn).load_matrix(900).unwrap().unwrap();
    assert_eq!(stored.rows.len(), 1);

    // AND the malformed one failed without writing anything
    match &report.questions[1].outcome {
        QuestionOutcome::Failed { code, message } => {
            assert_eq!(code, "ERR_INVALID_INPUT");
            assert!(message.contains("duplicate row id 52"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(SqliteMatrixStore::new(&conn).load_matrix(910).unwrap().is_none());

    let events = events_for_request(&conn, report.request_id.as_str()).unwrap();
    assert_eq!(events[2].kind.as_str(), "question_failed");
    assert_eq!(events[2].metadata["old_question_id"], 50);
}

#[test]
fn test_provenance_events_follow_question_outcomes() {
    let mut conn = setup_test_db();
    let report = restore_backup_file(&mut conn, &fixture("backup_partial_failure.yaml")).unwrap();

    let events = events_for_request(&conn, report.request_id.as_str()).unwrap();
    let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "restore_started",
            "question_failed",
            "question_restored",
            "restore_completed"
        ]
    );
    assert_eq!(events[1].metadata["old_question_id"], 20);
    assert_eq!(events[1].metadata["err_code"], "ERR_MISSING_MATRIX_RECORD");
    assert_eq!(events[2].metadata["new_question_id"], 800);
    assert_eq!(events[3].metadata["restored"], 1);
    assert_eq!(events[3].metadata["failed"], 1);
}

#[test]
fn test_restore_report_serializes_with_status_tag() {
    let mut conn = setup_test_db();
    let doc = parse_backup_file(&fixture("backup_partial_failure.yaml")).unwrap();
    let report = qmatrix_store::restore_backup(&mut conn, &doc).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["questions"][0]["outcome"]["status"], "failed");
    assert_eq!(json["questions"][1]["outcome"]["status"], "restored");
    assert_eq!(json["questions"][1]["mappings"][0]["kind"], "question");
}

#[test]
fn test_restore_logs_question_lifecycle() {
    let capture = qmatrix_core::logging_facility::init_test_capture();
    let mut conn = setup_test_db();

    restore_backup_file(&mut conn, &fixture("backup_partial_failure.yaml")).unwrap();

    capture.assert_event_exists("restore_backup", "start");
    capture.assert_event_exists("restore_backup", "end");
    capture.assert_event_exists("restore_question", "end_error");
    capture.assert_event_exists("restore_question", "end");
    assert!(!capture.warnings_for("restore_question").is_empty());
    assert!(!capture.warnings_for("recode_legacy_state").is_empty());
}

#[test]
fn test_caller_context_correlates_events() {
    use qmatrix_core_types::{RequestContext, RequestId};
    use qmatrix_store::restore::restore_backup_with_context;

    let mut conn = setup_test_db();
    let doc = parse_backup_file(&fixture("backup_create.yaml")).unwrap();
    let ctx = RequestContext::with_request_id(RequestId::from_string("req-fixed".to_string()));

    let report = restore_backup_with_context(&mut conn, &doc, &ctx).unwrap();

    assert_eq!(report.request_id.as_str(), "req-fixed");
    let events = events_for_request(&conn, "req-fixed").unwrap();
    assert_eq!(events.len(), 3);
    // no label on a caller-supplied context
    assert!(events[0].metadata["label"].is_null());
}
