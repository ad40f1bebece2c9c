//! Message composition.

use crate::config::ContentLimits;
use crate::error::{Error, Result};
use crate::record::{AuthorId, MessageId, NewRecord};

/// Builder for composing a new message.
///
/// Validation happens in [`build`](Self::build), before anything reaches a
/// store.
///
/// # Example
///
/// ```
/// use message_tree::config::ContentLimits;
/// use message_tree::record::{AuthorId, MessageId};
/// use message_tree::tree::MessageDraft;
///
/// let record = MessageDraft::new()
///     .author(AuthorId(1))
///     .content("Thanks, that fixed it!")
///     .reply_to(MessageId(42))
///     .build(&ContentLimits::default())
///     .unwrap();
/// assert_eq!(record.parent_id, Some(MessageId(42)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    content: Option<String>,
    author: Option<AuthorId>,
    parent: Option<MessageId>,
}

impl MessageDraft {
    /// Create a new, empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message text (required).
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the author (required).
    pub fn author(mut self, author: AuthorId) -> Self {
        self.author = Some(author);
        self
    }

    /// Make this message a reply to `parent`.
    ///
    /// The parent is not checked here; a store drops a parent it cannot resolve.
    pub fn reply_to(mut self, parent: MessageId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Validate the draft and turn it into a write request.
    ///
    /// Content must contain something other than whitespace, and its length
    /// in characters must lie within `limits`. Content is stored exactly as
    /// given; surrounding whitespace counts towards the length.
    pub fn build(self, limits: &ContentLimits) -> Result<NewRecord> {
        let author = self
            .author
            .ok_or_else(|| Error::validation("author is required"))?;

        let content = self
            .content
            .ok_or_else(|| Error::validation("content is required"))?;

        if content.trim().is_empty() {
            return Err(Error::validation("content cannot be empty"));
        }

        let chars = content.chars().count();
        if chars < limits.min_chars || chars > limits.max_chars {
            return Err(Error::validation(format!(
                "content must be {}-{} characters, got {chars}",
                limits.min_chars, limits.max_chars
            )));
        }

        Ok(NewRecord::new(content, author, self.parent))
    }
}
