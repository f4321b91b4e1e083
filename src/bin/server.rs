use std::{
    env,
    error::Error,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    process::exit,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker::{AppState, TokenConfig, build_router, graceful_shutdown, logging_middleware};

/// The environment variable holding the secret for signing access tokens.
const ACCESS_SECRET_VAR: &str = "JWT_ACCESS_SECRET";
/// The environment variable holding the secret for signing refresh tokens.
const REFRESH_SECRET_VAR: &str = "JWT_REFRESH_SECRET";

/// The REST API server for the expense tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The directory to save uploaded avatars to.
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// The canonical timezone that calendar days and months are counted in, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// How long access tokens stay valid, in minutes.
    #[arg(long, default_value_t = 15)]
    access_token_minutes: i64,

    /// How long refresh tokens stay valid, in days.
    #[arg(long, default_value_t = 7)]
    refresh_token_days: i64,

    /// Directory holding an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server uses plain HTTP when this is not given.
    #[arg(long)]
    cert_path: Option<PathBuf>,

    /// Log request and response bodies.
    #[arg(long)]
    log_bodies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let access_secret = read_secret(ACCESS_SECRET_VAR);
    let refresh_secret = read_secret(REFRESH_SECRET_VAR);
    if access_secret == refresh_secret {
        eprintln!("{ACCESS_SECRET_VAR} and {REFRESH_SECRET_VAR} must be different.");
        exit(1);
    }

    if args.access_token_minutes <= 0 || args.refresh_token_days <= 0 {
        eprintln!("Token lifetimes must be greater than zero.");
        exit(1);
    }

    let token_config = TokenConfig::new(&access_secret, &refresh_secret)
        .access_token_duration(Duration::minutes(args.access_token_minutes))
        .refresh_token_duration(Duration::days(args.refresh_token_days));

    std::fs::create_dir_all(&args.upload_dir)?;

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(connection, &token_config, &args.timezone, &args.upload_dir)?;

    let mut router = add_tracing_layer(build_router(state));
    if args.log_bodies {
        router = router.layer(middleware::from_fn(logging_middleware));
    }

    let addr = SocketAddr::new(args.host, args.port);
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    match args.cert_path {
        Some(cert_path) => {
            let tls_config = RustlsConfig::from_pem_file(
                cert_path.join("cert.pem"),
                cert_path.join("key.pem"),
            )
            .await?;

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
    }

    Ok(())
}

fn read_secret(name: &str) -> String {
    match env::var(name) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            eprintln!("The environment variable '{name}' must be set.");
            exit(1);
        }
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are turned into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
