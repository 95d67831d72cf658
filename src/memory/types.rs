//! Core memory type definitions.
//!
//! Defines [`MemoryRecord`] (a persisted row), [`ScoredMemory`] (a ranked
//! query hit), the typed operation results [`SaveAck`] and [`QueryOutcome`],
//! and the caller-facing [`SaveResponse`] / [`QueryResponse`] envelopes.

use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// A memory record, matching the `memory_records` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// `mem_` + UUID v7 (time-sortable).
    pub id: String,
    /// Optional grouping tag.
    pub session_id: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// The original text.
    pub content: String,
    /// Raw (un-normalized) embedding as returned by the embedding service.
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A single ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMemory {
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f32,
    pub content: String,
    pub timestamp: String,
    pub id: String,
}

/// Acknowledgment of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveAck {
    pub id: String,
}

/// Result of a query. `Empty` means nothing has been stored yet, which is
/// distinct from a search that matched zero records.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Empty,
    Matches(Vec<ScoredMemory>),
}

/// Counts reported by `memory stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub records: u64,
    pub indexed_vectors: usize,
    pub dimensions: usize,
    pub cached_embeddings: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_record: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Empty,
    Error,
}

/// Response envelope for the `save` operation exposed to agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: SaveStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl From<Result<SaveAck, MemoryError>> for SaveResponse {
    fn from(result: Result<SaveAck, MemoryError>) -> Self {
        match result {
            Ok(ack) => Self {
                status: SaveStatus::Success,
                message: "Text successfully saved to memory.".into(),
                record_id: Some(ack.id),
            },
            Err(e) => Self {
                status: SaveStatus::Error,
                message: e.to_string(),
                record_id: None,
            },
        }
    }
}

/// Response envelope for the `query` operation exposed to agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: QueryStatus,
    pub results: Vec<ScoredMemory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<QueryOutcome, MemoryError>> for QueryResponse {
    fn from(result: Result<QueryOutcome, MemoryError>) -> Self {
        match result {
            Ok(QueryOutcome::Matches(results)) => Self {
                status: QueryStatus::Success,
                results,
                message: None,
            },
            Ok(QueryOutcome::Empty) => Self {
                status: QueryStatus::Empty,
                results: Vec::new(),
                message: Some("Memory is empty. Nothing to search.".into()),
            },
            Err(e) => Self {
                status: QueryStatus::Error,
                results: Vec::new(),
                message: Some(e.to_string()),
            },
        }
    }
}

impl QueryResponse {
    /// Render the response as the plain-text listing agents read.
    pub fn render(&self, query: &str) -> String {
        match self.status {
            QueryStatus::Success if !self.results.is_empty() => {
                let mut out = format!(
                    "Found {} relevant memories for query '{query}':",
                    self.results.len()
                );
                for r in &self.results {
                    out.push_str(&format!(
                        "\n- [Similarity: {:.3}] ({}): {}",
                        r.similarity, r.timestamp, r.content
                    ));
                }
                out
            }
            QueryStatus::Success => "No relevant memories found.".into(),
            QueryStatus::Empty | QueryStatus::Error => self.message.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(similarity: f32, content: &str) -> ScoredMemory {
        ScoredMemory {
            similarity,
            content: content.into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            id: format!("mem_{content}"),
        }
    }

    #[test]
    fn save_response_carries_record_id() {
        let resp = SaveResponse::from(Ok(SaveAck { id: "mem_1".into() }));
        assert_eq!(resp.status, SaveStatus::Success);
        assert_eq!(resp.record_id.as_deref(), Some("mem_1"));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["record_id"], "mem_1");
    }

    #[test]
    fn save_response_error_has_no_record_id() {
        let resp = SaveResponse::from(Err(MemoryError::InvalidInput("text is empty".into())));
        assert_eq!(resp.status, SaveStatus::Error);
        assert!(resp.record_id.is_none());
        assert!(resp.message.contains("text is empty"));

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("record_id").is_none());
    }

    #[test]
    fn empty_outcome_maps_to_empty_status() {
        let resp = QueryResponse::from(Ok(QueryOutcome::Empty));
        assert_eq!(resp.status, QueryStatus::Empty);
        assert!(resp.results.is_empty());
        assert_eq!(resp.render("anything"), "Memory is empty. Nothing to search.");
    }

    #[test]
    fn zero_matches_is_success_not_empty() {
        let resp = QueryResponse::from(Ok(QueryOutcome::Matches(vec![])));
        assert_eq!(resp.status, QueryStatus::Success);
        assert_eq!(resp.render("q"), "No relevant memories found.");
    }

    #[test]
    fn render_lists_hits_with_three_decimals() {
        let resp = QueryResponse::from(Ok(QueryOutcome::Matches(vec![
            hit(1.0, "a"),
            hit(0.99388, "c"),
        ])));
        let text = resp.render("letters");
        assert!(text.starts_with("Found 2 relevant memories for query 'letters':"));
        assert!(text.contains("- [Similarity: 1.000] (2026-01-01T00:00:00Z): a"));
        assert!(text.contains("- [Similarity: 0.994] (2026-01-01T00:00:00Z): c"));
    }
}
