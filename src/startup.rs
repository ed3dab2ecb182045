use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::routes::{
    handle_create_subscription, handle_delete_subscription, handle_get_subscription,
    handle_list_subscriptions, handle_subscriptions_summary, handle_update_subscription,
    health_check,
};
use crate::storage::{
    schema::{init_schema, SchemaError},
    QueryTimeout,
};

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("Invalid database settings.")]
    DatabaseSettings(#[source] sqlx::Error),
    #[error("Failed to initialize the database schema.")]
    Schema(#[from] SchemaError),
    #[error("Failed to start the HTTP server.")]
    Io(#[from] std::io::Error),
}

pub struct Application {
    pub port: u16,
    pub server: Server,
    db_pool: PgPool,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        let db_pool = get_connection_db_pool(&config.database)?;

        init_schema(&db_pool, &config.database.get_migrations_dir()).await?;

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            db_pool.clone(),
            config.database.get_query_timeout(),
            config.get_shutdown_timeout(),
        )?;

        Ok(Self {
            port,
            server,
            db_pool,
        })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Serves until the server is stopped (SIGINT/SIGTERM), then closes the pool.
    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        let outcome = self.server.await;

        tracing::info!("HTTP server stopped, closing the database pool");
        self.db_pool.close().await;

        outcome
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    query_timeout: QueryTimeout,
    shutdown_timeout_seconds: u64,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let query_timeout = web::Data::new(query_timeout);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/subscriptions")
                    // Registered ahead of "/{id}" so "summary" is not taken for an id
                    .route("/summary", web::get().to(handle_subscriptions_summary))
                    .route("", web::get().to(handle_list_subscriptions))
                    .route("", web::post().to(handle_create_subscription))
                    .route("/", web::get().to(handle_list_subscriptions))
                    .route("/", web::post().to(handle_create_subscription))
                    .route("/{id}", web::get().to(handle_get_subscription))
                    .route("/{id}", web::put().to(handle_update_subscription))
                    .route("/{id}", web::delete().to(handle_delete_subscription)),
            )
            .app_data(db_pool.clone())
            .app_data(query_timeout.clone())
    })
    .shutdown_timeout(shutdown_timeout_seconds)
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Result<PgPool, StartupError> {
    let db_options = config
        .get_db_options()
        .map_err(StartupError::DatabaseSettings)?;

    Ok(PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .max_connections(config.max_connections)
        .connect_lazy_with(db_options))
}
