//! aac-site server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aac_api::{AppState, MAX_BODY_SIZE, rate_limit::limits};
use aac_common::{Config, build_storage, config::StorageKind};
use aac_core::AuthService;
use aac_db::{
    entities::profile::Role,
    repositories::{ProfileRepository, UserRepository},
};
use anyhow::Context;
use axum::{
    Router,
    http::{Method, header},
};
use clap::{Parser, Subcommand};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aac-site", version, about = "AAC Optics site and back office server")]
struct Cli {
    /// Configuration file. Defaults to `config/default` plus the `AAC_ENV` overlay.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations and serve the API (default).
    Serve,
    /// Run pending migrations and exit.
    Migrate,
    /// Give the account registered under EMAIL the admin role.
    GrantAdmin {
        email: String,
    },
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    config.context("Failed to load configuration")
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let db = Arc::new(aac_db::init(&config).await?);
    info!("Connected to database");

    aac_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = build_storage(&config.storage)?;
    let state = AppState::new(db, storage, &config)?;

    let limiter = state.rate_limiter.limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup(limits::MAX_WINDOW_SECS).await;
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE]);

    let app = with_public_files(aac_api::app(state), &config)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, site = %config.site.name, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Serve the local bucket directory under its public URL prefix.
fn with_public_files(app: Router, config: &Config) -> Router {
    let storage = &config.storage;
    if storage.backend != StorageKind::Local || !storage.public_url.starts_with('/') {
        return app;
    }

    let mount = format!(
        "{}/{}",
        storage.public_url.trim_end_matches('/'),
        storage.bucket
    );
    let dir = storage.base_path.join(&storage.bucket);
    info!(mount = %mount, dir = %dir.display(), "Serving public files");
    app.nest_service(&mount, ServeDir::new(dir))
}

async fn migrate(config: Config) -> anyhow::Result<()> {
    let db = aac_db::init(&config).await?;
    aac_db::migrate(&db).await?;
    info!("Migrations completed");
    Ok(())
}

async fn grant_admin(config: Config, email: &str) -> anyhow::Result<()> {
    let db = Arc::new(aac_db::init(&config).await?);
    let auth = AuthService::new(
        UserRepository::new(Arc::clone(&db)),
        ProfileRepository::new(db),
    );

    let user = auth.grant_role_by_email(email, Role::Admin).await?;
    info!(user_id = %user.id, email = %user.email, "Admin role granted");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aac=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(config).await,
        Command::GrantAdmin { email } => grant_admin(config, &email).await,
    }
}
