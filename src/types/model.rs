//! Model descriptors as reported by provider catalogs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A model offered by a provider, with the operations it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Bare model identifier (e.g. `"gemini-1.5-flash"`), without any
    /// provider resource prefix.
    pub id: String,
    /// Operations the model accepts (e.g. `"generateContent"`).
    pub supported_operations: BTreeSet<String>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            supported_operations: BTreeSet::new(),
        }
    }

    pub fn with_operation(mut self, op: impl Into<String>) -> Self {
        self.supported_operations.insert(op.into());
        self
    }

    pub fn supports(&self, op: &str) -> bool {
        self.supported_operations.contains(op)
    }
}
