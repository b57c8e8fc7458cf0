//! Session state — per-visitor selections, flow position, and message log.
//!
//! Everything here lives in memory for the lifetime of the process.
//! Nothing is persisted; a session dies with the page that created it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::flow::engine::FlowCursor;

/// Who produced a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

/// One turn in the message log. Append-only, never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Structured metadata, e.g. the raw backend response for proxied turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            details: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            details: None,
        }
    }

    pub fn assistant_with_details(content: impl Into<String>, details: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            details: Some(details),
        }
    }
}

/// One visitor's in-memory state.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    /// Accumulated selections. Monotone: keys are only ever added or
    /// overwritten, never removed — not even on flow abandonment.
    pub selections: serde_json::Map<String, Value>,
    pub cursor: FlowCursor,
    pub log: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            selections: serde_json::Map::new(),
            cursor: FlowCursor::default(),
            log: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Merge a selection into the session.
    pub fn record_selection(&mut self, key: &str, value: Value) {
        self.selections.insert(key.to_string(), value);
    }
}

/// In-memory session registry. All reads and writes funnel through
/// `with` / `update` so there is a single mutation path.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with the given opening turns; returns its id.
    pub async fn create(&self, opening: Vec<Message>) -> String {
        let mut session = Session::new();
        session.log = opening;
        let id = session.id.clone();
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    /// Read from a session. Returns None for unknown ids.
    pub async fn with<F, T>(&self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&Session) -> T,
    {
        self.sessions.read().await.get(id).map(f)
    }

    /// Mutate a session. Returns None for unknown ids.
    pub async fn update<F, T>(&self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Session) -> T,
    {
        self.sessions.write().await.get_mut(id).map(f)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
