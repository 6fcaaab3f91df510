use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use formweave_core::{AppError, AppResult};
use formweave_domain::{DocumentValues, ValidationRule};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::field_validator::FieldRules;
use crate::form_ports::SubmitHandler;

use super::{DocumentStateStore, SubmitOutcome};

#[derive(Default)]
struct RecordingSubmitHandler {
    calls: AtomicUsize,
    submitted: Mutex<Vec<DocumentValues>>,
    fail: bool,
}

#[async_trait]
impl SubmitHandler for RecordingSubmitHandler {
    async fn submit(&self, values: DocumentValues) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.submitted.lock().await.push(values);

        if self.fail {
            return Err(AppError::Internal("backend unavailable".to_owned()));
        }
        Ok(())
    }
}

fn values(raw: Value) -> DocumentValues {
    match raw {
        Value::Object(values) => values,
        _ => unreachable!(),
    }
}

fn email_rules() -> FieldRules {
    let mut rules = FieldRules::new();
    rules.insert(
        "email".to_owned(),
        vec![
            ValidationRule::required(None).unwrap_or_else(|_| unreachable!()),
            ValidationRule::email(None).unwrap_or_else(|_| unreachable!()),
        ],
    );
    rules
}

#[test]
fn update_field_clears_existing_error() {
    let store = DocumentStateStore::new(values(json!({"email": ""})));
    store.set_error("email", "This field is required");
    assert!(store.errors().contains_key("email"));

    store.update_field("email", json!("x@y.com"));

    assert!(!store.errors().contains_key("email"));
    assert_eq!(store.value("email"), json!("x@y.com"));
}

#[test]
fn validate_all_overwrites_error_map() {
    let store = DocumentStateStore::new(values(json!({"email": "not-an-email"})));
    store.set_error("stale", "left over");

    let is_valid = store.validate_all(&email_rules());

    assert!(!is_valid);
    let errors = store.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.get("email").map(String::as_str),
        Some("Please enter a valid email address")
    );
}

#[test]
fn validate_field_sets_then_clears_one_error() {
    let store = DocumentStateStore::new(values(json!({"email": "nope"})));
    let rules = email_rules();

    assert!(store.validate_field("email", &rules).is_some());
    assert!(store.errors().contains_key("email"));

    store.update_field("email", json!("a@b.io"));
    store.set_error("email", "server says no");
    assert!(store.validate_field("email", &rules).is_none());
    assert!(store.errors().is_empty());
}

#[test]
fn missing_value_reads_as_null() {
    let store = DocumentStateStore::new(DocumentValues::new());
    assert_eq!(store.value("absent"), Value::Null);
}

#[tokio::test]
async fn submit_forwards_values_when_valid() {
    let store = DocumentStateStore::new(values(json!({"email": "x@y.com"})));
    let handler = RecordingSubmitHandler::default();

    let outcome = store.submit(&email_rules(), &handler).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.unwrap_or_else(|_| unreachable!()), SubmitOutcome::Submitted);

    let submitted = handler.submitted.lock().await;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].get("email"), Some(&json!("x@y.com")));
    assert!(!store.is_submitting());
}

#[tokio::test]
async fn submit_skips_handler_when_invalid() {
    let store = DocumentStateStore::new(values(json!({"email": ""})));
    let handler = RecordingSubmitHandler::default();

    let outcome = store
        .submit(&email_rules(), &handler)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        store.errors().get("email").map(String::as_str),
        Some("This field is required")
    );
}

#[tokio::test]
async fn concurrent_submit_invokes_handler_once() {
    let store = DocumentStateStore::new(values(json!({"email": "x@y.com"})));
    let handler = RecordingSubmitHandler::default();
    let rules = email_rules();

    let (first, second) = tokio::join!(
        store.submit(&rules, &handler),
        store.submit(&rules, &handler)
    );

    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    let mut outcomes = vec![
        first.unwrap_or_else(|_| unreachable!()),
        second.unwrap_or_else(|_| unreachable!()),
    ];
    outcomes.sort_by_key(|outcome| *outcome == SubmitOutcome::Submitted);
    assert_eq!(
        outcomes,
        vec![SubmitOutcome::AlreadySubmitting, SubmitOutcome::Submitted]
    );

    let again = store.submit(&rules, &handler).await;
    assert!(matches!(again, Ok(SubmitOutcome::Submitted)));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn handler_failure_clears_flag_without_field_errors() {
    let store = DocumentStateStore::new(values(json!({"email": "x@y.com"})));
    let handler = RecordingSubmitHandler {
        fail: true,
        ..RecordingSubmitHandler::default()
    };

    let outcome = store.submit(&email_rules(), &handler).await;

    assert!(matches!(outcome, Err(AppError::Internal(_))));
    assert!(!store.is_submitting());
    assert!(store.errors().is_empty());
}

#[tokio::test]
async fn mutations_publish_new_revisions() {
    let store = DocumentStateStore::new(DocumentValues::new());
    let mut receiver = store.subscribe();
    let before = store.revision();

    store.update_field("name", json!("Ada"));

    assert!(receiver.has_changed().unwrap_or_default());
    assert!(*receiver.borrow_and_update() > before);
    assert!(store.revision() > before);
}

#[test]
fn snapshot_matches_individual_reads() {
    let store = DocumentStateStore::new(values(json!({"email": "x@y.com"})));
    store.set_error("email", "taken");
    store.update_field("name", json!("Ada"));

    let snapshot = store.snapshot();

    assert_eq!(snapshot.values, store.values());
    assert_eq!(snapshot.errors, store.errors());
    assert_eq!(snapshot.revision, store.revision());
    assert_eq!(snapshot.revision, 2);
    assert!(!snapshot.is_submitting);
}

#[test]
fn snapshot_never_mixes_revisions_under_concurrent_writes() {
    let store = Arc::new(DocumentStateStore::new(values(json!({"count": 0}))));
    let writer = {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            for count in 1..=500_u64 {
                store.set_error("count", "stale");
                store.update_field("count", json!(count));
            }
        })
    };

    for _ in 0..2_000 {
        let snapshot = store.snapshot();
        let count = snapshot.values.get("count").and_then(Value::as_u64);
        assert_eq!(count, Some(snapshot.revision / 2));
        assert_eq!(
            snapshot.errors.contains_key("count"),
            snapshot.revision % 2 == 1
        );
    }

    writer.join().unwrap_or_else(|_| unreachable!());
    assert_eq!(store.snapshot().revision, 1_000);
}
