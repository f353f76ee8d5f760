use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::NewSubscriber;

/// A persisted subscription. Fields are only readable: none of them changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct Subscription {
    id: Uuid,
    email: String,
    name: String,
    subscribed_at: DateTime<Utc>,
}

impl Subscription {
    /// Stamps a validated request with a fresh random identifier and the current time.
    pub fn register(new_subscriber: NewSubscriber) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new_subscriber.email,
            name: new_subscriber.name,
            subscribed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribed_at(&self) -> DateTime<Utc> {
        self.subscribed_at
    }
}
