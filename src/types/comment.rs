//! Comment and axis profile types.
//!
//! Both are supplied and owned by the caller; the engine never mutates them.

use serde::{Deserialize, Serialize};

/// A user comment, possibly a reply to another comment.
///
/// `parent_id`/`parent_text` establish the reply edge used by stance
/// synthesis. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Identifier, unique within its collection.
    pub id: String,
    /// Raw comment text; may be multi-line and non-Latin script.
    pub text: String,
    /// Display name of the comment author.
    pub author: String,
    /// Like count at retrieval time.
    #[serde(default)]
    pub like_count: u64,
    /// Publication timestamp as supplied by the source.
    #[serde(default)]
    pub published_at: String,
    /// Identifier of the parent comment, when this is a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Text of the parent comment, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_text: Option<String>,
}

impl Comment {
    /// Create a top-level comment with the given id and text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: String::new(),
            like_count: 0,
            published_at: String::new(),
            parent_id: None,
            parent_text: None,
        }
    }

    /// Create a reply to the given parent comment.
    pub fn reply(
        id: impl Into<String>,
        text: impl Into<String>,
        parent_id: impl Into<String>,
        parent_text: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            parent_text: Some(parent_text.into()),
            ..Self::new(id, text)
        }
    }

    /// Set the like count.
    pub fn likes(mut self, count: u64) -> Self {
        self.like_count = count;
        self
    }

    /// Set the author name.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Whether this comment is a reply.
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Per-document stance axis: the central claim the content takes a
/// position on, and the creator's own stance toward it.
///
/// Produced once per document, then read-only; safe to cache and reuse
/// across all comments of that document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisProfile {
    /// Identifier of the document (e.g. video id) this axis belongs to.
    pub video_id: String,
    /// The central claim, as free text.
    pub main_axis: String,
    /// The document owner's position on the main axis.
    pub creator_position: String,
    /// What or whom the content criticises, if anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_of_criticism: Option<String>,
    /// Values the content explicitly supports, if stated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_values: Option<Vec<String>>,
    /// When this profile was generated, as supplied by the producer.
    #[serde(default)]
    pub generated_at: String,
}

impl AxisProfile {
    /// Create a profile with the required fields.
    pub fn new(
        video_id: impl Into<String>,
        main_axis: impl Into<String>,
        creator_position: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            main_axis: main_axis.into(),
            creator_position: creator_position.into(),
            target_of_criticism: None,
            supported_values: None,
            generated_at: String::new(),
        }
    }
}
