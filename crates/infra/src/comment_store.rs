//! In-memory comment store.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use quorum_core::{CommentId, DomainError, PollId, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub poll_id: PollId,
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRecord {
    pub fn new(poll_id: PollId, author: UserId, body: String) -> Self {
        Self {
            id: CommentId::new(),
            poll_id,
            author,
            body,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CommentStore {
    inner: RwLock<HashMap<CommentId, CommentRecord>>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, comment: CommentRecord) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("comment store lock poisoned"))?;
        map.insert(comment.id, comment);
        Ok(())
    }

    pub fn list_for_poll(&self, poll_id: &PollId) -> Vec<CommentRecord> {
        match self.inner.read() {
            Ok(map) => {
                let mut comments: Vec<_> = map
                    .values()
                    .filter(|c| &c.poll_id == poll_id)
                    .cloned()
                    .collect();
                comments.sort_by_key(|c| c.created_at);
                comments
            }
            Err(_) => vec![],
        }
    }

    pub fn get(&self, id: &CommentId) -> Option<CommentRecord> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    pub fn delete(&self, id: &CommentId) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("comment store lock poisoned"))?;
        map.remove(id).map(|_| ()).ok_or(DomainError::NotFound)
    }

    /// Drop every comment attached to `poll_id` (poll deletion cascade).
    pub fn delete_for_poll(&self, poll_id: &PollId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|_, c| &c.poll_id != poll_id);
        }
    }
}
