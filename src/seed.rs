//! Demo data for an [`InMemoryStore`].
//!
//! Seeds a handful of authors and conversations, including one very deep
//! reply chain, so lazy expansion and full-tree rendering can be exercised
//! against realistic shapes.

use tracing::{debug, info};

use crate::error::Result;
use crate::record::{AuthorId, MessageId, MessageRecord, Timestamp};
use crate::store::InMemoryStore;

/// Depth of the long reply chain created by [`seed_demo_data`].
pub const DEFAULT_CHAIN_DEPTH: usize = 100;

const MINUTE: i64 = 60 * 1000;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

const AUTHORS: [(&str, &str); 5] = [
    ("admin", "admin@example.com"),
    ("alice", "alice@example.com"),
    ("bob", "bob@example.com"),
    ("charlie", "charlie@example.com"),
    ("diana", "diana@example.com"),
];

const TECH_POINTS: [&str; 10] = [
    "Microservices offer better scalability",
    "But they increase complexity",
    "Containers help with deployment",
    "Orchestration becomes essential",
    "Circuit breakers prevent cascade failures",
    "Distributed tracing is crucial for debugging",
    "Event-driven architecture improves decoupling",
    "Eventual consistency is a trade-off",
    "Monitoring and observability are key",
    "Culture change is the biggest challenge",
];

const WEEKEND_PLANS: [&str; 5] = [
    "Going hiking if the weather holds",
    "Catching up on reading",
    "Visiting family",
    "Trying a new recipe",
    "Absolutely nothing, and proudly so",
];

/// What [`seed_demo_data`] created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Registered authors, in registration order
    pub authors: Vec<AuthorId>,
    /// Top-level messages, oldest first
    pub roots: Vec<MessageId>,
    /// Root of the deep reply chain
    pub deep_chain_root: MessageId,
    /// Last reply in the deep chain
    pub deep_chain_tip: MessageId,
    /// Total number of messages created
    pub messages: usize,
}

/// Seed the store with demo data and a [`DEFAULT_CHAIN_DEPTH`]-level reply chain.
pub async fn seed_demo_data(store: &InMemoryStore) -> Result<SeedSummary> {
    seed_with_depth(store, DEFAULT_CHAIN_DEPTH, Timestamp::now()).await
}

/// Seed the store with demo data, a `depth`-level reply chain, and
/// timestamps relative to `now`.
pub async fn seed_with_depth(
    store: &InMemoryStore,
    depth: usize,
    now: Timestamp,
) -> Result<SeedSummary> {
    let mut authors = Vec::with_capacity(AUTHORS.len());
    for (username, email) in AUTHORS {
        authors.push(store.register_author(username, email).await);
    }

    let mut seeder = Seeder {
        store,
        authors: &authors,
        next_id: store.next_message_id().await,
        created: 0,
    };
    let now = now.as_millis();

    let openers: [(&str, i64); 4] = [
        ("Welcome to the message board! This is the first message.", 29),
        ("Anyone want to discuss the latest technology trends?", 28),
        ("Nice weather today! What is everyone up to?", 27),
        ("Does anyone know how to speed up a slow web service?", 26),
    ];
    let mut roots = Vec::with_capacity(openers.len() + 2);
    for (index, (content, days_ago)) in openers.into_iter().enumerate() {
        let id = seeder
            .add(content.to_string(), index, None, now - days_ago * DAY)
            .await?;
        roots.push(id);
    }

    // Deep conversation under the welcome message
    let deep_chain_root = roots[0];
    let chain_start = now - 29 * DAY;
    let mut parent = deep_chain_root;
    for level in 1..=depth {
        parent = seeder
            .add(
                chain_content(level),
                level,
                Some(parent),
                chain_start + level as i64 * 10 * MINUTE,
            )
            .await?;
        debug!(level, "seeded chain message");
    }
    let deep_chain_tip = parent;

    let tech_start = now - 20 * DAY;
    let tech_root = seeder
        .add(
            "Let's discuss the pros and cons of microservices.".to_string(),
            1,
            None,
            tech_start,
        )
        .await?;
    roots.push(tech_root);
    let mut parent = tech_root;
    for point in 1..=20 {
        let content = format!(
            "Tech discussion point {point}: {}",
            TECH_POINTS[(point - 1) % TECH_POINTS.len()]
        );
        parent = seeder
            .add(content, point, Some(parent), tech_start + point as i64 * HOUR)
            .await?;
    }

    let chat_start = now - 15 * DAY;
    let chat_root = seeder
        .add("What are your weekend plans?".to_string(), 2, None, chat_start)
        .await?;
    roots.push(chat_root);
    let mut parent = chat_root;
    for turn in 1..=15 {
        let content = format!(
            "Weekend chat {turn}: {}",
            WEEKEND_PLANS[(turn - 1) % WEEKEND_PLANS.len()]
        );
        parent = seeder
            .add(content, turn, Some(parent), chat_start + turn as i64 * 2 * HOUR)
            .await?;
    }

    let created = seeder.created;
    let summary = SeedSummary {
        authors,
        roots,
        deep_chain_root,
        deep_chain_tip,
        messages: created,
    };
    info!(
        authors = summary.authors.len(),
        messages = summary.messages,
        depth,
        "seeded demo data"
    );
    Ok(summary)
}

fn chain_content(level: usize) -> String {
    match level {
        1..=10 => format!("Reply level {level}: This is getting interesting!"),
        11..=30 => format!("Level {level}: Deep conversation continues..."),
        31..=50 => format!("Level {level}: We're going deeper into this topic."),
        51..=75 => format!("Level {level}: Amazing how deep we can nest messages!"),
        76..=90 => format!("Level {level}: Almost reaching the century mark!"),
        _ => format!("Level {level}: Still going."),
    }
}

struct Seeder<'a> {
    store: &'a InMemoryStore,
    authors: &'a [AuthorId],
    next_id: u64,
    created: usize,
}

impl Seeder<'_> {
    /// Insert one message authored round-robin by `author_index`.
    async fn add(
        &mut self,
        content: String,
        author_index: usize,
        parent_id: Option<MessageId>,
        created_at: i64,
    ) -> Result<MessageId> {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.store
            .insert(MessageRecord {
                id,
                content,
                author_id: self.authors[author_index % self.authors.len()],
                parent_id,
                created_at: Timestamp(created_at),
            })
            .await?;
        self.created += 1;
        Ok(id)
    }
}
