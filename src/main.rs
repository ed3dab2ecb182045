use subscriptions::config::{get_configuration, get_environment};
use subscriptions::startup::Application;
use subscriptions::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = get_configuration()?;
    let subscriber = get_subscriber(
        String::from("subscriptions"),
        config.get_log_level(),
        std::io::stdout,
    );

    init_subscriber(subscriber)?;

    tracing::info!("Application environment = {:?}", get_environment()?);

    let application = Application::build(config.clone()).await.map_err(|err| {
        tracing::error!("Failed to start the application: {:?}", err);
        err
    })?;

    tracing::info!("Server listening on {}", config.get_address());

    application.run_until_stop().await?;

    tracing::info!("Server stopped gracefully");

    Ok(())
}
