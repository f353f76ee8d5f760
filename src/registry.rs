use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{NewSubscriber, Subscription};
use crate::store::{InsertError, StorageError, SubscriptionStore};
use crate::utils::error_chain_fmt;

/// Front door for creating and reading subscriptions.
///
/// The registry keeps no state of its own besides a handle to the store: cloning it is cheap and
/// any number of clones (or processes) can serve requests side by side. Email uniqueness is
/// decided by the store in the same step that writes the record.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn SubscriptionStore>,
    operation_timeout: Duration,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn SubscriptionStore>, operation_timeout: Duration) -> Self {
        Self {
            store,
            operation_timeout,
        }
    }

    /// Creates a subscription for `email`, or fails with `DuplicateEmail` if one already exists.
    ///
    /// Only presence of both fields is validated. The uniqueness check is not a read followed by
    /// a write: two concurrent calls could both observe "no such email" and both insert. The
    /// store performs check and insert as one atomic step and reports the loser as a duplicate.
    #[tracing::instrument(
        name = "Adding a new subscriber",
        skip(self, email, name),
        fields(
            subscriber_email = %email,
            subscriber_name = %name,
            subscription_id = tracing::field::Empty
        )
    )]
    pub async fn subscribe(
        &self,
        email: String,
        name: String,
    ) -> Result<Subscription, SubscribeError> {
        let new_subscriber =
            NewSubscriber::parse(email, name).map_err(SubscribeError::InvalidInput)?;
        let subscription = Subscription::register(new_subscriber);
        tracing::Span::current().record(
            "subscription_id",
            &tracing::field::display(subscription.id()),
        );

        self.with_timeout(self.store.insert(&subscription))
            .await
            .map_err(|e| match e {
                InsertError::DuplicateEmail => {
                    tracing::warn!("Rejected a subscription for an email already registered");
                    SubscribeError::DuplicateEmail(subscription.email().to_owned())
                }
                InsertError::Storage(e) => {
                    tracing::error!(error.cause_chain = ?e, "Failed to store a subscription");
                    SubscribeError::StorageUnavailable(e)
                }
            })?;

        Ok(subscription)
    }

    /// Pure read of the latest committed state. Any string is accepted: an address that was never
    /// subscribed, well formed or not, is simply `NotFound`.
    #[tracing::instrument(
        name = "Looking up a subscriber",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    pub async fn lookup(&self, email: &str) -> Result<Subscription, LookupError> {
        self.with_timeout(self.store.find_by_email(email))
            .await
            .map_err(|e| {
                tracing::error!(error.cause_chain = ?e, "Failed to fetch a subscription");
                LookupError::StorageUnavailable(e)
            })?
            .ok_or(LookupError::NotFound)
    }

    /// Bounds a storage round-trip by the configured timeout. Expiry is reported as a transient
    /// storage failure. Postgres enforces a shorter `statement_timeout` on its side, so in
    /// practice this only fires when the server stops answering altogether.
    async fn with_timeout<T, E>(
        &self,
        operation: impl Future<Output = Result<T, E>>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        tokio::time::timeout(self.operation_timeout, operation)
            .await
            .unwrap_or_else(|_| Err(StorageError::TimedOut(self.operation_timeout).into()))
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0} is already subscribed.")]
    DuplicateEmail(String),
    #[error("Failed to store the new subscription.")]
    StorageUnavailable(#[source] StorageError),
}

impl SubscribeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(e) if e.is_transient())
    }
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum LookupError {
    #[error("No subscription exists for this email.")]
    NotFound,
    #[error("Failed to fetch the subscription.")]
    StorageUnavailable(#[source] StorageError),
}

impl LookupError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(e) if e.is_transient())
    }
}

impl std::fmt::Debug for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
