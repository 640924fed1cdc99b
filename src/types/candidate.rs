//! Ordered candidate model identifiers.

use std::fmt;

use crate::{FitgenError, Result};

/// Ordered, non-empty list of model identifiers to try for one operation.
///
/// Index 0 is the most preferred candidate. The list itself tolerates
/// duplicates; [`ModelResolver`](crate::resolver::ModelResolver) never
/// produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList(Vec<String>);

impl CandidateList {
    /// Build a list from identifiers in preference order.
    ///
    /// Fails with [`FitgenError::InvalidInput`] when `ids` is empty.
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(FitgenError::InvalidInput(
                "candidate list must not be empty".into(),
            ));
        }
        Ok(Self(ids))
    }

    /// Build from a compile-time list known to be non-empty.
    pub(crate) fn from_static(ids: &'static [&'static str]) -> Self {
        debug_assert!(!ids.is_empty());
        Self(ids.iter().map(|s| s.to_string()).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most preferred candidate.
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_rejected() {
        let err = CandidateList::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, FitgenError::InvalidInput(_)));
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let list = CandidateList::new(["b", "a", "b"]).unwrap();
        assert_eq!(list.as_slice(), ["b", "a", "b"]);
        assert_eq!(list.first(), "b");
        assert_eq!(list.to_string(), "b, a, b");
    }
}
