//! In-memory poll store.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use quorum_core::{DomainError, PollId, UserId};

/// One choice within a poll, with the principals that picked it.
#[derive(Debug, Clone, Serialize)]
pub struct PollOption {
    pub label: String,
    pub voters: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollRecord {
    pub id: PollId,
    pub question: String,
    pub options: Vec<PollOption>,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PollRecord {
    pub fn new(question: String, option_labels: Vec<String>, author: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: PollId::new(),
            question,
            options: option_labels
                .into_iter()
                .map(|label| PollOption {
                    label,
                    voters: Vec::new(),
                })
                .collect(),
            author,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default)]
pub struct PollStore {
    inner: RwLock<HashMap<PollId, PollRecord>>,
}

impl PollStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, poll: PollRecord) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("poll store lock poisoned"))?;
        map.insert(poll.id, poll);
        Ok(())
    }

    pub fn get(&self, id: &PollId) -> Option<PollRecord> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    pub fn list(&self) -> Vec<PollRecord> {
        match self.inner.read() {
            Ok(map) => {
                let mut polls: Vec<_> = map.values().cloned().collect();
                polls.sort_by_key(|p| p.created_at);
                polls
            }
            Err(_) => vec![],
        }
    }

    /// Record `voter`'s vote for `option_index`.
    ///
    /// A principal holds at most one vote per poll; voting again moves it.
    pub fn vote(
        &self,
        id: &PollId,
        option_index: usize,
        voter: UserId,
    ) -> Result<PollRecord, DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("poll store lock poisoned"))?;

        let poll = map.get_mut(id).ok_or(DomainError::NotFound)?;
        if option_index >= poll.options.len() {
            return Err(DomainError::validation(format!(
                "option index {} out of range (poll has {} options)",
                option_index,
                poll.options.len()
            )));
        }

        for option in &mut poll.options {
            option.voters.retain(|v| v != &voter);
        }
        poll.options[option_index].voters.push(voter);
        poll.updated_at = Utc::now();
        Ok(poll.clone())
    }

    pub fn delete(&self, id: &PollId) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("poll store lock poisoned"))?;
        map.remove(id).map(|_| ()).ok_or(DomainError::NotFound)
    }
}
