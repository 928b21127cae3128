// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use cloudinary_client::{CloudinaryClient, CloudinaryOptions};
use mailer::{MailerOptions, MailerService};
use marketplace_core::domains::auth::JwtService;
use marketplace_core::kernel::{CloudinaryAdapter, MailerAdapter, PgStore, ServerDeps, SystemClock};
use marketplace_core::server::{build_app, AppOptions, AppState};
use marketplace_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,marketplace_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Listings Marketplace API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let store = Arc::new(PgStore::new(pool));
    let mailer = Arc::new(MailerService::new(MailerOptions {
        api_key: config.resend_api_key,
        from: config.email_from,
        base_url: None,
    }));
    let cloudinary = Arc::new(CloudinaryClient::new(CloudinaryOptions {
        cloud_name: config.cloudinary_cloud_name,
        api_key: config.cloudinary_api_key,
        api_secret: config.cloudinary_api_secret,
        folder: config.cloudinary_folder,
    }));

    let deps = ServerDeps::builder()
        .accounts(store.clone())
        .listings(store.clone())
        .favorites(store)
        .email(Arc::new(MailerAdapter::new(mailer)))
        .images(Arc::new(CloudinaryAdapter::new(cloudinary)))
        .clock(Arc::new(SystemClock))
        .jwt_service(Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer)))
        .email_timeout(config.email_timeout)
        .build();

    let state = AppState {
        deps: Arc::new(deps),
        secure_cookies: config.secure_cookies,
    };
    if !config.rate_limit_enabled {
        tracing::warn!("Rate limiting on /auth is disabled");
    }
    let app = build_app(
        state,
        AppOptions {
            rate_limit_enabled: config.rate_limit_enabled,
            allowed_origins: config.allowed_origins,
        },
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
