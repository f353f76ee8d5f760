//! Storage seam of the registry.
//!
//! Every uniqueness guarantee lives behind `SubscriptionStore::insert`: implementations must
//! check and insert as one atomic step, so the registry never reads before it writes.

mod memory;
mod postgres;

pub use memory::InMemorySubscriptionStore;
pub use postgres::{migrate, PostgresSubscriptionStore};

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Subscription;

/// SQLSTATE classes worth retrying: connection exceptions, transaction rollbacks (serialization
/// failures, deadlocks), insufficient resources and operator intervention (e.g. shutdowns).
const TRANSIENT_SQLSTATE_CLASSES: [&str; 4] = ["08", "40", "53", "57"];

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persists `subscription` unless its email is already taken.
    async fn insert(&self, subscription: &Subscription) -> Result<(), InsertError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Subscription>, StorageError>;
}

#[derive(thiserror::Error, Debug)]
pub enum InsertError {
    #[error("The email is already used by another subscription.")]
    DuplicateEmail,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("The storage layer did not answer within {0:?}.")]
    TimedOut(Duration),
    #[error("A database error was encountered.")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Whether retrying the same operation later has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::TimedOut(_) => true,
            StorageError::Database(e) => match e {
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
                sqlx::Error::Database(db_error) => db_error
                    .code()
                    .map(|code| {
                        TRANSIENT_SQLSTATE_CLASSES
                            .iter()
                            .any(|class| code.starts_with(*class))
                    })
                    .unwrap_or(false),
                _ => false,
            },
        }
    }
}
