//! Telemetry metric name constants.
//!
//! Centralised metric names for fitgen operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `fitgen_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `operation`: logical operation (e.g. "text", "vision", "speech")
//! - `outcome`: per-attempt result: "success", "retryable" or "fatal"
//! - `status`: overall result: "ok" or "error"

/// Total candidate attempts made by the fallback invoker.
///
/// Labels: `operation`, `outcome`.
pub const ATTEMPTS_TOTAL: &str = "fitgen_attempts_total";

/// Total invocations (one per candidate walk).
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const INVOCATIONS_TOTAL: &str = "fitgen_invocations_total";

/// Duration of a full candidate walk in seconds.
///
/// Labels: `operation`.
pub const INVOCATION_DURATION_SECONDS: &str = "fitgen_invocation_duration_seconds";

/// Times the resolver fell back to its static model list.
///
/// Labels: `operation`.
pub const RESOLVER_FALLBACKS_TOTAL: &str = "fitgen_resolver_fallbacks_total";

/// Total local cache hits.
pub const CACHE_HITS_TOTAL: &str = "fitgen_cache_hits_total";

/// Total local cache misses (absent, stale, mismatched or unreadable).
pub const CACHE_MISSES_TOTAL: &str = "fitgen_cache_misses_total";

/// Entries removed because they were stale, version-mismatched or corrupt.
pub const CACHE_EVICTIONS_TOTAL: &str = "fitgen_cache_evictions_total";
