use chirpy::configuration::get_configuration;
use chirpy::startup::{run, Stores};
use chirpy::store::PgStore;
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // A missing signing secret is fatal
    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }
    tracing::info!("Configuration loaded successfully");

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to migrate the database: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
        })?;
    tracing::info!("Database ready");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let stores = Stores::from_backend(Arc::new(PgStore::new(pool)));
    let server = run(listener, stores, configuration)?;

    server.await
}
