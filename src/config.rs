//! Engine configuration.
//!
//! The engine reads no files or environment variables itself. Host
//! applications build an [`EngineConfig`] directly or deserialize it from
//! their own configuration source.

use std::time::Duration;

use serde::Deserialize;

/// Default minimum content length, in characters.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 3;

/// Default maximum content length, in characters.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 200;

/// Bounds applied to message content by [`MessageDraft::build`](crate::tree::MessageDraft::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentLimits {
    /// Minimum number of characters
    pub min_chars: usize,
    /// Maximum number of characters
    pub max_chars: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CONTENT_CHARS,
            max_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}

/// Configuration for [`MessageTree`](crate::engine::MessageTree).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for each individual store read, `None` for no deadline
    #[serde(rename = "read_timeout_ms", deserialize_with = "millis::deserialize")]
    pub read_timeout: Option<Duration>,
    /// Content bounds for submitted drafts
    pub content: ContentLimits,
}

impl EngineConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-read deadline.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the content bounds.
    pub fn content_limits(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.content = ContentLimits {
            min_chars,
            max_chars,
        };
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
