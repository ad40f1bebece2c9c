//! Stored message and author records.
//!
//! These are the units exchanged with a [`RecordStore`](crate::store::RecordStore).
//! Records are flat: a message only knows its parent's identifier, never its
//! children. Turning records into nested views is the job of [`crate::tree`].

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Identifier of a message, unique and stable once assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub u64);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AuthorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Creation time in milliseconds since the Unix epoch.
///
/// Used for ordering only. Two messages may share a timestamp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The current wall-clock time.
    ///
    /// Clocks set before the epoch collapse to zero.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public display fields of an author.
///
/// Carries no credentials; this is all a view ever exposes about its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    /// Author identifier
    pub id: AuthorId,
    /// Display name
    pub username: String,
    /// Contact address
    pub email: String,
}

impl AuthorSummary {
    /// Create a new author summary.
    pub fn new(id: AuthorId, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }
}

/// A message as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Unique identifier
    pub id: MessageId,
    /// Message text
    pub content: String,
    /// Author reference, immutable after creation
    pub author_id: AuthorId,
    /// Parent message, or `None` for a top-level message
    pub parent_id: Option<MessageId>,
    /// Creation time
    pub created_at: Timestamp,
}

impl MessageRecord {
    /// Check if this record replies to another message.
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A record joined with its author summary, as returned by store fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// The stored record
    pub record: MessageRecord,
    /// The author's summary, or `None` if the author reference did not resolve
    pub author: Option<AuthorSummary>,
}

impl StoredMessage {
    /// Join a record with its author.
    pub fn new(record: MessageRecord, author: Option<AuthorSummary>) -> Self {
        Self { record, author }
    }

    /// Identifier of the underlying record.
    pub fn id(&self) -> MessageId {
        self.record.id
    }

    /// Creation time of the underlying record.
    pub fn created_at(&self) -> Timestamp {
        self.record.created_at
    }
}

/// A request to persist a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Message text
    pub content: String,
    /// Author of the message
    pub author_id: AuthorId,
    /// Message being replied to, if any
    pub parent_id: Option<MessageId>,
}

impl NewRecord {
    /// Create a new write request.
    pub fn new(
        content: impl Into<String>,
        author_id: AuthorId,
        parent_id: Option<MessageId>,
    ) -> Self {
        Self {
            content: content.into(),
            author_id,
            parent_id,
        }
    }
}
