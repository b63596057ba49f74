#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the ZAN dashboard.
//!
//! Loads both perimeter datasets once at startup and serves one JSON
//! endpoint per metrics builder under `/api`. Requests read an immutable
//! snapshot of the datasets; `POST /api/reload`, when enabled, publishes a
//! fresh snapshot without interrupting requests in flight. An optional
//! directory of built frontend files is served at `/`.

pub mod config;
mod handlers;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use zan_dashboard_dataset::context::{DatasetContext, SharedContext};

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Current dataset snapshot.
    pub context: SharedContext,
    /// Directory reloads read from.
    pub data_dir: PathBuf,
    /// Whether `POST /api/reload` is enabled.
    pub allow_reload: bool,
}

impl AppState {
    /// Wraps an already-loaded context.
    #[must_use]
    pub fn new(context: DatasetContext, allow_reload: bool) -> Self {
        Self {
            data_dir: context.data_dir().to_path_buf(),
            context: SharedContext::new(context),
            allow_reload,
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
            .route("/health", web::get().to(handlers::health))
            .route("/metrics", web::get().to(handlers::metrics))
            .route("/evolution", web::get().to(handlers::evolution))
            .route("/repartition", web::get().to(handlers::repartition))
            .route("/top-communes", web::get().to(handlers::top_communes))
            .route("/typologie", web::get().to(handlers::typologie))
            .route("/trajectoire", web::get().to(handlers::trajectoire))
            .route("/densification", web::get().to(handlers::densification))
            .route("/risques", web::get().to(handlers::risques))
            .route("/benchmark", web::get().to(handlers::benchmark))
            .route("/filters", web::get().to(handlers::filters))
            .route("/metadata", web::get().to(handlers::metadata))
            .route("/reload", web::post().to(handlers::reload)),
    );
}

/// Starts the ZAN dashboard API server.
///
/// Loads every perimeter from `config.data_dir` and starts the Actix-Web
/// HTTP server. A perimeter that fails to load does not prevent startup:
/// its endpoints answer `503` until a successful reload. This is a regular
/// async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Loading datasets from {}...", config.data_dir.display());
    let context = DatasetContext::load(&config.data_dir);
    if context.load_error().is_none() {
        log::info!("Loaded perimeters: {:?}", context.loaded_perimeters());
    } else {
        log::warn!("Starting without data; every builder will answer 503");
    }

    if config.allow_reload {
        log::info!("POST /api/reload is enabled");
    }

    let state = web::Data::new(AppState::new(context, config.allow_reload));
    let static_dir = config.static_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();
        let static_dir = static_dir.clone();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            .configure(move |cfg| {
                // Serve frontend static files (production)
                if let Some(dir) = static_dir {
                    cfg.service(Files::new("/", dir).index_file("index.html"));
                }
            })
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
