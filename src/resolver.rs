//! Model resolution: which candidates to try, in which order.
//!
//! [`ModelResolver`] turns a provider's live model catalog into an ordered
//! [`CandidateList`]. Stable models come before preview/experimental ones,
//! and within each group models are ordered by family priority (see
//! [`FamilyBucket`]). When discovery fails or yields nothing usable, the
//! policy's static list is used instead, so resolution never fails.
//!
//! ```rust
//! # use fitgen::resolver::ModelResolver;
//! # use fitgen::types::ModelDescriptor;
//! let resolver = ModelResolver::gemini_text();
//! let ranked = resolver.rank(&[
//!     ModelDescriptor::new("gemini-2.0-flash-exp").with_operation("generateContent"),
//!     ModelDescriptor::new("gemini-1.5-pro").with_operation("generateContent"),
//!     ModelDescriptor::new("gemini-1.5-flash").with_operation("generateContent"),
//! ]);
//! assert_eq!(ranked, ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash-exp"]);
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::providers::traits::ModelCatalog;
use crate::telemetry;
use crate::types::{CandidateList, ModelDescriptor};
use crate::{FitgenError, Result};

/// Gemini operation name for content generation (text and vision).
pub const GENERATE_CONTENT: &str = "generateContent";

/// Identifier segments that mark a model as preview/experimental.
pub const DEFAULT_PREVIEW_MARKERS: &[&str] = &["preview", "exp", "experimental", "beta"];

/// Static text candidates used when discovery yields nothing.
pub const GEMINI_TEXT_FALLBACK: &[&str] = &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"];

/// Static vision candidates used when discovery yields nothing.
pub const GEMINI_VISION_FALLBACK: &[&str] =
    &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro-vision"];

/// Speech models, tried in order. Speech has no discovery step.
pub const SPEECH_MODELS: &[&str] = &["gpt-4o-mini-tts", "tts-1", "tts-1-hd"];

/// A family of models sharing a priority.
///
/// A model belongs to the first bucket (in declaration order) whose
/// substrings all occur in its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyBucket {
    pub label: String,
    /// Lower sorts first.
    pub priority: u8,
    pub all_of: Vec<String>,
}

impl FamilyBucket {
    pub fn new(label: impl Into<String>, priority: u8, all_of: &[&str]) -> Self {
        Self {
            label: label.into(),
            priority,
            all_of: all_of.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, id: &str) -> bool {
        self.all_of.iter().all(|s| id.contains(s.as_str()))
    }
}

/// Ordering rules and fallback list for one operation.
#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    /// Label used in logs and metrics (e.g. "text").
    pub label: &'static str,
    /// Operation a model must support to be considered. `None` keeps all.
    pub required_operation: Option<String>,
    pub preview_markers: Vec<String>,
    pub buckets: Vec<FamilyBucket>,
    /// Priority of models matching no bucket.
    pub default_priority: u8,
    pub static_fallback: Vec<String>,
}

impl ResolverPolicy {
    /// Gemini text generation: flash, then pro, then other Gemini models,
    /// then other vendors, then Gemma.
    pub fn gemini_text() -> Self {
        Self {
            label: "text",
            required_operation: Some(GENERATE_CONTENT.to_string()),
            preview_markers: DEFAULT_PREVIEW_MARKERS.iter().map(|s| s.to_string()).collect(),
            buckets: gemini_buckets(),
            default_priority: 3,
            static_fallback: GEMINI_TEXT_FALLBACK.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Gemini image analysis. Same ordering as text; different static list.
    pub fn gemini_vision() -> Self {
        Self {
            label: "vision",
            static_fallback: GEMINI_VISION_FALLBACK.iter().map(|s| s.to_string()).collect(),
            ..Self::gemini_text()
        }
    }

    /// Speech synthesis. Always resolves to the static model list.
    pub fn speech() -> Self {
        Self {
            label: "speech",
            required_operation: None,
            preview_markers: DEFAULT_PREVIEW_MARKERS.iter().map(|s| s.to_string()).collect(),
            buckets: Vec::new(),
            default_priority: 0,
            static_fallback: SPEECH_MODELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the static fallback list.
    pub fn static_fallback<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_fallback = ids.into_iter().map(Into::into).collect();
        self
    }

    fn is_preview(&self, id: &str) -> bool {
        id.to_lowercase()
            .split(['-', '.', '_', '/'])
            .any(|seg| self.preview_markers.iter().any(|m| m == seg))
    }

    fn priority(&self, id: &str) -> u8 {
        let lower = id.to_lowercase();
        self.buckets
            .iter()
            .find(|b| b.matches(&lower))
            .map(|b| b.priority)
            .unwrap_or(self.default_priority)
    }
}

fn gemini_buckets() -> Vec<FamilyBucket> {
    vec![
        FamilyBucket::new("gemini-flash", 0, &["gemini", "flash"]),
        FamilyBucket::new("gemini-pro", 1, &["gemini", "pro"]),
        FamilyBucket::new("gemini-other", 2, &["gemini"]),
        FamilyBucket::new("gemma", 4, &["gemma"]),
    ]
}

/// Produces ordered candidate lists for one operation.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    policy: ResolverPolicy,
    fallback: CandidateList,
}

impl ModelResolver {
    /// Create a resolver. Fails if the policy's static list is empty.
    pub fn new(policy: ResolverPolicy) -> Result<Self> {
        let fallback = CandidateList::new(policy.static_fallback.clone()).map_err(|_| {
            FitgenError::Configuration(format!(
                "static model list for '{}' must not be empty",
                policy.label
            ))
        })?;
        Ok(Self { policy, fallback })
    }

    /// Resolver for Gemini text generation with the built-in static list.
    pub fn gemini_text() -> Self {
        Self::from_builtin(ResolverPolicy::gemini_text(), GEMINI_TEXT_FALLBACK)
    }

    /// Resolver for Gemini image analysis with the built-in static list.
    pub fn gemini_vision() -> Self {
        Self::from_builtin(ResolverPolicy::gemini_vision(), GEMINI_VISION_FALLBACK)
    }

    /// Resolver for speech synthesis.
    pub fn speech() -> Self {
        Self::from_builtin(ResolverPolicy::speech(), SPEECH_MODELS)
    }

    fn from_builtin(policy: ResolverPolicy, fallback: &'static [&'static str]) -> Self {
        Self {
            policy,
            fallback: CandidateList::from_static(fallback),
        }
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// The static list used when discovery yields nothing.
    pub fn static_candidates(&self) -> &CandidateList {
        &self.fallback
    }

    /// Resolve candidates, preferring `prefetched` over a live catalog fetch.
    ///
    /// Catalog failures are logged and treated as an empty catalog; this
    /// method never fails and never returns an empty list.
    pub async fn resolve(
        &self,
        catalog: Option<&dyn ModelCatalog>,
        prefetched: Option<Vec<ModelDescriptor>>,
    ) -> CandidateList {
        let models = match (prefetched, catalog) {
            (Some(models), _) => models,
            (None, Some(catalog)) => match catalog.list_models().await {
                Ok(models) => models,
                Err(e) => {
                    warn!(
                        provider = catalog.name(),
                        operation = self.policy.label,
                        error = %e,
                        "model discovery failed, using static model list"
                    );
                    Vec::new()
                }
            },
            (None, None) => Vec::new(),
        };

        let ranked = self.rank(&models);
        match CandidateList::new(ranked) {
            Ok(candidates) => {
                debug!(operation = self.policy.label, %candidates, "resolved candidates");
                candidates
            }
            Err(_) => {
                metrics::counter!(telemetry::RESOLVER_FALLBACKS_TOTAL,
                    "operation" => self.policy.label,
                )
                .increment(1);
                self.fallback.clone()
            }
        }
    }

    /// Order `models` by the policy. Pure; may return an empty list.
    ///
    /// Models lacking the required operation are dropped, stable models
    /// precede preview ones, each group is sorted by family priority
    /// (stable sort), and duplicates keep their first position.
    pub fn rank(&self, models: &[ModelDescriptor]) -> Vec<String> {
        let mut seen = HashSet::new();
        let usable = models.iter().filter(|&m| {
            let supported = self
                .policy
                .required_operation
                .as_deref()
                .is_none_or(|op| m.supports(op));
            supported && !m.id.trim().is_empty() && seen.insert(m.id.as_str())
        });

        let (mut stable, mut preview): (Vec<&ModelDescriptor>, Vec<&ModelDescriptor>) =
            usable.partition(|m| !self.policy.is_preview(&m.id));

        stable.sort_by_key(|m| self.policy.priority(&m.id));
        preview.sort_by_key(|m| self.policy.priority(&m.id));

        stable
            .into_iter()
            .chain(preview)
            .map(|m| m.id.clone())
            .collect()
    }
}
