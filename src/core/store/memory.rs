//! In-memory session state store
//!
//! Keyed record collections with entry-level atomic updates. Data is lost on
//! restart; the store fills the role a database would in a deployed setup
//! and exposes the same operation contract the repositories are written
//! against.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::core::store::models::{RefreshToken, User};

/// Result of a conditional update on a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Predicate held and the mutation was applied
    Updated,
    /// Record exists but the predicate rejected it
    PredicateFailed,
    /// No record under that key
    NotFound,
}

/// A keyed collection of records.
///
/// Mutating operations hold the entry lock for their full duration, so a
/// predicate check and the mutation it guards observe the same state. The
/// lock is never held across an await point; callers receive copies.
#[derive(Debug, Clone)]
pub struct Collection<T: Clone> {
    records: Arc<DashMap<Uuid, T>>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }

    /// Fetch a copy of the record under `id`
    pub fn get(&self, id: Uuid) -> Option<T> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    /// Insert or replace the record under `id`
    pub fn insert(&self, id: Uuid, record: T) {
        self.records.insert(id, record);
    }

    /// Apply `mutate` to the record under `id` only while `predicate` holds
    pub fn conditional_update(
        &self,
        id: Uuid,
        predicate: impl FnOnce(&T) -> bool,
        mutate: impl FnOnce(&mut T),
    ) -> UpdateOutcome {
        match self.records.get_mut(&id) {
            Some(mut entry) => {
                if predicate(entry.value()) {
                    mutate(entry.value_mut());
                    UpdateOutcome::Updated
                } else {
                    UpdateOutcome::PredicateFailed
                }
            }
            None => UpdateOutcome::NotFound,
        }
    }

    /// Apply `mutate` to every record matching `filter`; returns how many
    /// records changed
    pub fn update_many(&self, filter: impl Fn(&T) -> bool, mutate: impl Fn(&mut T)) -> u64 {
        let mut count = 0;
        for mut entry in self.records.iter_mut() {
            if filter(entry.value()) {
                mutate(entry.value_mut());
                count += 1;
            }
        }
        count
    }

    /// Collect copies of every record matching `filter`
    pub fn find(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of records in the collection
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle over the store's collections.
///
/// Cloning is cheap and every clone sees the same data.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub users: Collection<User>,
    pub refresh_tokens: Collection<RefreshToken>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}
