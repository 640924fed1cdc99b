//! Per-attempt invocation results.

use crate::FitgenError;

/// Whether a failed attempt should move on to the next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Try the next candidate.
    Retryable,
    /// Stop immediately and surface the error.
    Fatal,
}

/// A classified attempt failure.
#[derive(Debug)]
pub struct Failure {
    pub class: FailureClass,
    pub error: FitgenError,
}

impl Failure {
    pub fn retryable(error: FitgenError) -> Self {
        Self {
            class: FailureClass::Retryable,
            error,
        }
    }

    pub fn fatal(error: FitgenError) -> Self {
        Self {
            class: FailureClass::Fatal,
            error,
        }
    }

    /// Upstream HTTP status, when known.
    pub fn status(&self) -> Option<u16> {
        self.error.status()
    }
}

/// Result of invoking an operation against a single candidate.
#[derive(Debug)]
pub enum InvocationOutcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> InvocationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Success(_))
    }
}
