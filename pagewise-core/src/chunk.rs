//! Paged listing data model.
//!
//! A paginated listing is delivered as a series of chunks whose sizes the
//! server decides. Each chunk carries zero or more items plus an optional
//! continuation token; a missing token means the listing is complete.

use serde::{Deserialize, Serialize};

/// Opaque continuation token identifying the next chunk of a listing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    /// Create a token from its string form.
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    /// Interpret a token string as it appears on the wire, where an empty
    /// string is the conventional encoding for "no more pages".
    ///
    /// # Example
    ///
    /// ```
    /// use pagewise_core::PageToken;
    ///
    /// assert!(PageToken::from_wire("").is_none());
    /// assert_eq!(PageToken::from_wire("abc").unwrap().as_str(), "abc");
    /// ```
    pub fn from_wire<S: Into<String>>(token: S) -> Option<Self> {
        let token = token.into();
        if token.is_empty() { None } else { Some(Self(token)) }
    }

    /// The token's string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning its string form.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One server-delivered batch of a paginated listing.
///
/// Items are opaque to this layer; the chunk is only a container of
/// zero or more of them plus the continuation token threading the listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk<T> {
    /// Items in this chunk. May be empty even when more chunks follow.
    #[serde(default)]
    pub items: Vec<T>,
    /// Token for requesting the next chunk. Absent on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<PageToken>,
}

impl<T> Chunk<T> {
    /// A chunk followed by more chunks when `next_page_token` is present.
    pub fn new(items: Vec<T>, next_page_token: Option<PageToken>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }

    /// The final chunk of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    /// An empty final chunk.
    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    /// Number of items in this chunk.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this chunk carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_token_from_wire() {
        assert_eq!(PageToken::from_wire(""), None);
        assert_eq!(
            PageToken::from_wire("next-42"),
            Some(PageToken::new("next-42"))
        );
    }

    #[test]
    fn test_chunk_constructors() {
        let chunk = Chunk::new(vec![1, 2, 3], Some(PageToken::new("t")));
        assert_eq!(chunk.len(), 3);
        assert!(chunk.next_page_token.is_some());

        let last: Chunk<i32> = Chunk::last(vec![4]);
        assert!(last.next_page_token.is_none());

        let empty: Chunk<i32> = Chunk::empty();
        assert!(empty.is_empty());
        assert!(empty.next_page_token.is_none());
    }

    #[test]
    fn test_chunk_deserialize_missing_fields() {
        let chunk: Chunk<String> = serde_json::from_str("{}").unwrap();
        assert!(chunk.is_empty());
        assert!(chunk.next_page_token.is_none());
    }

    #[test]
    fn test_chunk_serde_round_trip() {
        let chunk = Chunk::new(
            vec!["a".to_string(), "b".to_string()],
            Some(PageToken::new("more")),
        );
        let json = serde_json::to_string(&chunk).unwrap();
        let back: Chunk<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
