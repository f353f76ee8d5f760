use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{dev::Server, web, App, HttpServer};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing_actix_web::TracingLogger;

use crate::configuration::{DatabaseSettings, Settings};
use crate::registry::SubscriptionRegistry;
use crate::routes;
use crate::store::{self, PostgresSubscriptionStore};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        if configuration.database.migrate_on_startup {
            store::migrate(&connection_pool)
                .await
                .context("Failed to migrate the database")?;
        }

        let registry = SubscriptionRegistry::new(
            Arc::new(PostgresSubscriptionStore::new(connection_pool)),
            configuration.registry.operation_timeout(),
        );

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        // Port 0 lets the OS pick, so read back what we actually got
        let port = listener.local_addr()?.port();
        let server = run(listener, registry)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Only returns when the application is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Connections are opened on first use, so building the pool never blocks on Postgres.
pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(configuration.acquire_timeout())
        .connect_lazy_with(configuration.with_db())
}

pub fn run(listener: TcpListener, registry: SubscriptionRegistry) -> Result<Server, std::io::Error> {
    let registry = web::Data::new(registry);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(routes::health_check))
            .route("/subscriptions", web::post().to(routes::subscribe))
            .route("/subscriptions", web::get().to(routes::lookup))
            .app_data(registry.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
