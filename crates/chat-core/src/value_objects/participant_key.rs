//! Participant-set key used to deduplicate 1:1 conversations
//!
//! The key is the sorted, deduplicated list of participant ids joined with `:`.
//! Two requests naming the same people in any order produce the same key, so
//! the store's unique index on `(posting_ref, kind, participant_key)` can
//! arbitrate concurrent creations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantKey(String);

impl ParticipantKey {
    /// Build the key for a set of users
    pub fn from_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = UserId>,
    {
        let mut ids: Vec<UserId> = users.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let key = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(":");
        Self(key)
    }

    /// Wrap a key previously produced by [`ParticipantKey::from_users`]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of users encoded in the key
    pub fn len(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split(':').count()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
