use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{InsertError, StorageError, SubscriptionStore};
use crate::domain::Subscription;

/// Process-local store keyed by email. The whole check-and-insert runs under one lock, which
/// gives it the same all-or-nothing behaviour as the `UNIQUE` constraint in Postgres.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry behind.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Result<(), InsertError> {
        match self.lock().entry(subscription.email().to_owned()) {
            Entry::Occupied(_) => Err(InsertError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(subscription.clone());
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Subscription>, StorageError> {
        Ok(self.lock().get(email).cloned())
    }
}
