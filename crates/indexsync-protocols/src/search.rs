//! Search results.

/// Result of a search request.
///
/// An empty query is answered with [`SearchOutcome::NoContent`] without
/// touching the index, which keeps "nothing asked" apart from "nothing found".
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<T> {
    NoContent,
    Hits(Vec<T>),
}

impl<T> SearchOutcome<T> {
    pub fn is_no_content(&self) -> bool {
        matches!(self, SearchOutcome::NoContent)
    }

    /// Hits, or an empty list for [`SearchOutcome::NoContent`].
    pub fn into_hits(self) -> Vec<T> {
        match self {
            SearchOutcome::NoContent => Vec::new(),
            SearchOutcome::Hits(hits) => hits,
        }
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
