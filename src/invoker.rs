//! Fallback invoker with classified failure semantics.
//!
//! [`FallbackInvoker`] walks a [`CandidateList`] in order, running the same
//! logical operation against each candidate model until one succeeds.
//!
//! # Fallback Triggers
//!
//! Each failed attempt is classified by the [`InvocationContext`]:
//! - `Retryable`: record the error and try the next candidate
//! - `Fatal`: stop and return the error unchanged
//!
//! When every candidate fails with a retryable error the invoker returns
//! [`FitgenError::Exhausted`], naming all tried candidates and the kind of
//! the last failure.
//!
//! # Flow
//!
//! ```text
//! candidates: [gemini-1.5-flash, gemini-1.5-pro]
//!                     │
//!                     ▼
//!         ┌─────────────────────┐
//!         │  gemini-1.5-flash   │ ──► 503 overloaded (retryable)
//!         └─────────┬───────────┘
//!                   │ next
//!                   ▼
//!         ┌─────────────────────┐
//!         │  gemini-1.5-pro     │ ──► 200 → return payload
//!         └─────────────────────┘
//! ```
//!
//! Attempts are strictly sequential. The invoker adds no delay, timeout or
//! cancellation of its own; timeouts belong to the transport.

use std::future::Future;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::telemetry;
use crate::types::{CandidateList, Failure, FailureClass, InvocationOutcome};
use crate::{ErrorKind, FitgenError, Result};

/// The kind of operation being invoked. Determines which failures are
/// retried across candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationContext {
    /// Text generation.
    Text,
    /// Image analysis.
    Vision,
    /// Speech synthesis.
    Speech,
}

impl InvocationContext {
    pub fn as_str(self) -> &'static str {
        match self {
            InvocationContext::Text => "text",
            InvocationContext::Vision => "vision",
            InvocationContext::Speech => "speech",
        }
    }

    /// Decide whether `err` should move on to the next candidate.
    ///
    /// Generation contexts retry overloaded, not-found, unsupported-model
    /// (upstream 400) and rate-limited failures. Speech retries only a
    /// missing model. Authentication failures are always fatal.
    pub fn classify(self, err: &FitgenError) -> FailureClass {
        let retryable = match self {
            InvocationContext::Text | InvocationContext::Vision => matches!(
                err.kind(),
                ErrorKind::Overloaded | ErrorKind::NotFound | ErrorKind::RateLimited
            ),
            InvocationContext::Speech => matches!(err, FitgenError::ModelNotFound(_)),
        };
        if retryable {
            FailureClass::Retryable
        } else {
            FailureClass::Fatal
        }
    }

    /// Convert a provider result into a classified outcome.
    pub fn outcome<T>(self, result: Result<T>) -> InvocationOutcome<T> {
        match result {
            Ok(value) => InvocationOutcome::Success(value),
            Err(error) => InvocationOutcome::Failure(Failure {
                class: self.classify(&error),
                error,
            }),
        }
    }
}

/// Sequential candidate walker.
#[derive(Debug, Clone, Copy)]
pub struct FallbackInvoker {
    context: InvocationContext,
}

impl FallbackInvoker {
    pub fn new(context: InvocationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> InvocationContext {
        self.context
    }

    /// Run `op` against each candidate until one succeeds.
    ///
    /// `op` receives the candidate identifier and returns an already
    /// classified [`InvocationOutcome`]. Each attempt is assumed atomic:
    /// it fully succeeds or fails without side effects to roll back.
    #[instrument(skip_all, fields(operation = self.context.as_str(), candidates = candidates.len()))]
    pub async fn invoke<T, F, Fut>(&self, candidates: &CandidateList, mut op: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = InvocationOutcome<T>>,
    {
        let operation = self.context.as_str();
        let start = Instant::now();
        let mut tried = Vec::with_capacity(candidates.len());
        let mut last_err: Option<FitgenError> = None;

        for (attempt, candidate) in candidates.iter().enumerate() {
            tried.push(candidate.clone());
            match op(candidate.clone()).await {
                InvocationOutcome::Success(value) => {
                    debug!(candidate = %candidate, attempt = attempt + 1, "candidate succeeded");
                    Self::record_attempt(operation, "success");
                    Self::record_invocation(operation, start, true);
                    return Ok(value);
                }
                InvocationOutcome::Failure(Failure {
                    class: FailureClass::Retryable,
                    error,
                }) => {
                    warn!(
                        candidate = %candidate,
                        attempt = attempt + 1,
                        status = ?error.status(),
                        error = %error,
                        "candidate failed, trying next"
                    );
                    Self::record_attempt(operation, "retryable");
                    last_err = Some(error);
                }
                InvocationOutcome::Failure(Failure {
                    class: FailureClass::Fatal,
                    error,
                }) => {
                    warn!(
                        candidate = %candidate,
                        attempt = attempt + 1,
                        status = ?error.status(),
                        error = %error,
                        "candidate failed fatally, not trying further candidates"
                    );
                    Self::record_attempt(operation, "fatal");
                    Self::record_invocation(operation, start, false);
                    return Err(error);
                }
            }
        }

        Self::record_invocation(operation, start, false);
        let (last, retry_after) = last_err
            .as_ref()
            .map(|e| (e.kind(), e.retry_after()))
            .unwrap_or((ErrorKind::Unknown, None));
        warn!(tried = ?tried, last = %last, "all candidates exhausted");
        Err(FitgenError::Exhausted {
            tried,
            last,
            retry_after,
        })
    }

    /// Like [`invoke`](Self::invoke) for operations returning a plain
    /// `Result`, classified with this invoker's context.
    pub async fn invoke_with<T, F, Fut>(&self, candidates: &CandidateList, mut op: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let context = self.context;
        self.invoke(candidates, |candidate| {
            let attempt = op(candidate);
            async move { context.outcome(attempt.await) }
        })
        .await
    }

    fn record_attempt(operation: &'static str, outcome: &'static str) {
        metrics::counter!(telemetry::ATTEMPTS_TOTAL,
            "operation" => operation,
            "outcome" => outcome,
        )
        .increment(1);
    }

    fn record_invocation(operation: &'static str, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::INVOCATIONS_TOTAL,
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::INVOCATION_DURATION_SECONDS,
            "operation" => operation,
        )
        .record(start.elapsed().as_secs_f64());
    }
}
