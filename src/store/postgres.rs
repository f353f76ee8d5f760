use async_trait::async_trait;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;

use super::{InsertError, StorageError, SubscriptionStore};
use crate::domain::Subscription;

/// SQLSTATE raised by Postgres on a `UNIQUE` violation.
const UNIQUE_VIOLATION: &str = "23505";
/// Name Postgres generates for the `UNIQUE` constraint on `subscriptions.email`.
const EMAIL_UNIQUE_CONSTRAINT: &str = "subscriptions_email_key";

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies the embedded migrations. Already applied migrations are skipped, so running it on
/// every startup is safe.
#[tracing::instrument(name = "Running database migrations", skip(pool))]
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[derive(Clone, Debug)]
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    #[tracing::instrument(
        name = "Saving new subscription details in the database",
        skip(self, subscription),
        fields(subscription_id = %subscription.id())
    )]
    async fn insert(&self, subscription: &Subscription) -> Result<(), InsertError> {
        // A plain INSERT: the UNIQUE constraint on `email` arbitrates concurrent writers.
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, email, name, subscribed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(subscription.id())
        .bind(subscription.email())
        .bind(subscription.name())
        .bind(subscription.subscribed_at())
        .execute(&self.pool)
        .await
        .map_err(classify_insert_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetching a subscription by email", skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscription>, StorageError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, email, name, subscribed_at
            FROM subscriptions
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }
}

fn classify_insert_error(e: sqlx::Error) -> InsertError {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.code().as_deref() == Some(UNIQUE_VIOLATION)
            && db_error.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
        {
            return InsertError::DuplicateEmail;
        }
    }
    InsertError::Storage(e.into())
}
