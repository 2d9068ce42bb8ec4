mod handlers;

use std::{
    fs::File,
    io::BufReader,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::http::StatusCode;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    normalize_path::NormalizePathLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};
use wharfhook_core::config::Config;
use wharfhook_events::{BuildEventHandler, HandlerOptions};
use wharfhook_github::GitHubStatusSink;
use wharfhook_registry::quay::{QuayTagResolver, QuayTagger};

#[derive(Clone)]
pub struct AppState {
    handler: BuildEventHandler,
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::builder()
        // Default to info level
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config: Config = {
        let file = BufReader::new(File::open("config.yml").expect("Failed to open config file"));
        serde_yaml::from_reader(file).expect("Failed to parse config file")
    };

    let statuses = GitHubStatusSink::new(&config.github).expect("Failed to create GitHub client");
    let resolver = QuayTagResolver::new(&config.registry);
    let tagger = QuayTagger::new(&config.registry).expect("Failed to create registry tagger");
    let handler = BuildEventHandler::new(HandlerOptions {
        statuses: Some(Arc::new(statuses)),
        resolver: Some(Arc::new(resolver)),
        tagger: Some(Arc::new(tagger)),
    });
    let state = AppState { handler };

    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(NormalizePathLayer::trim_trailing_slash());
    let router = handlers::build_router().with_state(state).layer(middleware);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.server.port));
    tracing::info!("Web server: Listening on {}", addr);
    let listener = TcpListener::bind(addr).await.expect("bind error");
    if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await {
        tracing::error!("Web server error: {e}");
    }
    tracing::info!("Shut down gracefully");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        tokio::select! {
            result = signal::ctrl_c() => result.expect("Failed to listen for ctrl-c"),
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
    }
}
