use subscription_registry::configuration::get_configuration;
use subscription_registry::startup::Application;
use subscription_registry::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "subscription_registry".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    // Panic if we can't read configuration
    let configuration = get_configuration().expect("Failed to read configuration.");
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Subscription registry is listening");
    application.run_until_stopped().await?;

    Ok(())
}
