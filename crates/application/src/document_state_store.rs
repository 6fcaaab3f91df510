use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use formweave_core::AppResult;
use formweave_domain::{DocumentErrors, DocumentValues, value_of};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::field_validator::{FieldRules, validate_document, validate_value};
use crate::form_ports::SubmitHandler;

/// Result of one submit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Values passed validation and the handler completed.
    Submitted,
    /// Validation failed; errors were published and the handler was not called.
    Invalid,
    /// Another submission was in flight; this request was dropped.
    AlreadySubmitting,
    /// Values passed validation but the handler failed; the failure was logged.
    HandlerFailed,
}

#[derive(Debug, Default)]
struct DocumentState {
    values: DocumentValues,
    errors: DocumentErrors,
}

/// Values, errors, submission flag and revision read together.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Current values.
    pub values: DocumentValues,
    /// Current errors.
    pub errors: DocumentErrors,
    /// Whether a submission is in flight.
    pub is_submitting: bool,
    /// Revision the snapshot was taken at.
    pub revision: u64,
}

/// Live values, per-field errors and submission status of one editing session.
///
/// Mutations are serialized behind a lock and each one publishes a new revision
/// to subscribers before the lock is released.
#[derive(Debug)]
pub struct DocumentStateStore {
    state: RwLock<DocumentState>,
    submitting: AtomicBool,
    revision: watch::Sender<u64>,
}

impl DocumentStateStore {
    /// Creates a store seeded with initial values and no errors.
    #[must_use]
    pub fn new(values: DocumentValues) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(DocumentState {
                values,
                errors: DocumentErrors::new(),
            }),
            submitting: AtomicBool::new(false),
            revision,
        }
    }

    /// Returns a snapshot of all values.
    #[must_use]
    pub fn values(&self) -> DocumentValues {
        self.read().values.clone()
    }

    /// Returns a snapshot of all errors.
    #[must_use]
    pub fn errors(&self) -> DocumentErrors {
        self.read().errors.clone()
    }

    /// Returns values, errors, submission flag and revision from one read.
    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        let state = self.read();
        DocumentSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            is_submitting: self.is_submitting(),
            revision: self.revision(),
        }
    }

    /// Returns one value; absent keys read as `null`.
    #[must_use]
    pub fn value(&self, key: &str) -> Value {
        value_of(&self.read().values, key).clone()
    }

    /// Overwrites one value and clears that key's error.
    pub fn update_field(&self, key: &str, value: Value) {
        self.mutate(|state| {
            state.values.insert(key.to_owned(), value);
            state.errors.remove(key);
        });
    }

    /// Sets the error message of one key.
    pub fn set_error(&self, key: &str, message: impl Into<String>) {
        let message = message.into();
        self.mutate(|state| {
            state.errors.insert(key.to_owned(), message);
        });
    }

    /// Clears the error message of one key.
    pub fn clear_error(&self, key: &str) {
        self.mutate(|state| {
            state.errors.remove(key);
        });
    }

    /// Validates one key, then sets or clears its error.
    pub fn validate_field(&self, key: &str, rules_by_key: &FieldRules) -> Option<String> {
        self.mutate(|state| {
            let message = rules_by_key
                .get(key)
                .and_then(|rules| validate_value(value_of(&state.values, key), rules));
            match &message {
                Some(message) => {
                    state.errors.insert(key.to_owned(), message.clone());
                }
                None => {
                    state.errors.remove(key);
                }
            }
            message
        })
    }

    /// Validates every key and replaces the whole error map with the result.
    ///
    /// Returns whether no key produced an error.
    pub fn validate_all(&self, rules_by_key: &FieldRules) -> bool {
        self.mutate(|state| {
            state.errors = validate_document(&state.values, rules_by_key);
            state.errors.is_empty()
        })
    }

    /// Returns whether a submission is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Validates all fields and forwards the values to `handler` when valid.
    ///
    /// Requests made while a submission is in flight are dropped. The in-flight
    /// flag is cleared when the handler completes or fails. Handler failures
    /// are returned to the caller and never recorded as field errors.
    pub async fn submit(
        &self,
        rules_by_key: &FieldRules,
        handler: &dyn SubmitHandler,
    ) -> AppResult<SubmitOutcome> {
        {
            let _state = self.write();
            if self
                .submitting
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!("submit dropped while another submission is in flight");
                return Ok(SubmitOutcome::AlreadySubmitting);
            }
            self.revision.send_modify(|revision| *revision += 1);
        }
        let _in_flight = InFlightGuard { store: self };

        if !self.validate_all(rules_by_key) {
            return Ok(SubmitOutcome::Invalid);
        }

        handler.submit(self.values()).await?;
        Ok(SubmitOutcome::Submitted)
    }

    /// Returns the current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribes to revision changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn mutate<R>(&self, change: impl FnOnce(&mut DocumentState) -> R) -> R {
        let mut state = self.write();
        let result = change(&mut state);
        self.revision.send_modify(|revision| *revision += 1);
        result
    }

    fn read(&self) -> RwLockReadGuard<'_, DocumentState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DocumentState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

struct InFlightGuard<'a> {
    store: &'a DocumentStateStore,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store.mutate(|_| {
            self.store.submitting.store(false, Ordering::Release);
        });
    }
}

#[cfg(test)]
mod tests;
