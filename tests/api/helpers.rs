use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use subscription_registry::configuration::{get_configuration, DatabaseSettings};
use subscription_registry::startup::{get_connection_pool, Application};
use subscription_registry::telemetry::{get_subscriber, init_subscriber};
use uuid::Uuid;

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    // The sink is part of the type returned by `get_subscriber`, hence the two branches.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_subscriptions(&self, body: String) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscriptions", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_subscription(&self, email: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/subscriptions", &self.address))
            .query(&[("email", email)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn stored_subscriptions(&self) -> Vec<(String, String)> {
        sqlx::query_as::<_, (String, String)>("SELECT email, name FROM subscriptions")
            .fetch_all(&self.db_pool)
            .await
            .expect("Failed to fetch saved subscriptions.")
    }
}

pub async fn spawn_app() -> TestApp {
    // The first time `force` is invoked the code in `TRACING` is executed. All other invocations
    // will instead skip execution.
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // Every test gets its own logical database
        c.database.database_name = Uuid::new_v4().to_string();
        // Use a random OS port
        c.application.port = 0;
        // Let the application apply the migrations the way it does in production
        c.database.migrate_on_startup = true;
        c
    };

    create_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        db_pool: get_connection_pool(&configuration.database),
        api_client: reqwest::Client::new(),
    }
}

async fn create_database(config: &DatabaseSettings) {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database.");
}
