use actix_cors::Cors;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use std::future::Future;
use std::sync::{Arc, Mutex};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config::Config;
use crate::middleware::RequestMetrics;
use crate::store::UserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Serving,
    Draining,
    Stopped,
}

impl ServerState {
    fn can_advance_to(self, next: ServerState) -> bool {
        use ServerState::*;
        matches!(
            (self, next),
            (Starting, Serving) | (Serving, Draining) | (Draining, Stopped) | (Starting, Stopped) | (Serving, Stopped)
        )
    }
}

/// Process-wide server state: Starting → Serving → Draining → Stopped.
pub struct Lifecycle {
    state: Mutex<ServerState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState::Starting),
        }
    }

    pub fn state(&self) -> ServerState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Moves to `next` if the transition is legal. Returns false (and leaves the state alone) otherwise.
    pub fn advance(&self, next: ServerState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !state.can_advance_to(next) {
            log::warn!("⚠️ Ignoring lifecycle transition {:?} -> {:?}", *state, next);
            return false;
        }
        log::info!("🔄 Server {:?} -> {:?}", *state, next);
        *state = next;
        true
    }
}

/// Routes shared by the running server and the handler tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(api::health::health_check))
        // Metrics
        .route("/metrics", web::get().to(api::metrics::get_metrics))
        // Users collection
        .service(
            web::resource("/users/")
                .route(web::post().to(api::users::create_user))
                .route(web::get().to(api::users::list_users)),
        )
        // Single user
        .service(
            web::resource("/users/{id}")
                .route(web::get().to(api::users::get_user))
                .route(web::put().to(api::users::put_user))
                .route(web::patch().to(api::users::patch_user))
                .route(web::delete().to(api::users::delete_user)),
        );
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = if origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
        .max_age(3600)
}

/// Binds the listener. Signal handling is left to [`serve`].
pub fn build_server(config: &Config, store: web::Data<UserStore>) -> std::io::Result<Server> {
    let origins = config.cors_allowed_origins.clone();
    let openapi = api::swagger::ApiDoc::openapi();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(build_cors(&origins))
            .wrap(RequestMetrics)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .configure(configure_routes)
    })
    .disable_signals()
    .shutdown_timeout(config.shutdown_timeout.as_secs())
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}

/// Runs `server` until it stops. When `shutdown` resolves the server stops accepting
/// connections and in-flight requests get the configured grace period before workers are killed.
pub async fn serve<F>(server: Server, lifecycle: Arc<Lifecycle>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + 'static,
{
    let handle = server.handle();
    lifecycle.advance(ServerState::Serving);

    let drain_lifecycle = lifecycle.clone();
    actix_rt::spawn(async move {
        shutdown.await;
        if drain_lifecycle.advance(ServerState::Draining) {
            log::info!("🛑 Shutting down the server...");
            handle.stop(true).await;
        }
    });

    let result = server.await;
    if let Err(e) = &result {
        log::error!("❌ Server error: {}", e);
    }
    lifecycle.advance(ServerState::Stopped);
    log::info!("👋 Server exiting ({:?})", lifecycle.state());
    result
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("❌ Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("❌ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => log::info!("📴 Received SIGINT"),
        _ = terminate => log::info!("📴 Received SIGTERM"),
    }
}

/// Full startup: bind, serve, drain on signal.
pub async fn run(config: Config) -> std::io::Result<()> {
    let lifecycle = Arc::new(Lifecycle::new());
    let store = web::Data::new(UserStore::new(config.id_strategy.generator()));

    let server = match build_server(&config, store) {
        Ok(server) => server,
        Err(e) => {
            log::error!("❌ Failed to bind {}:{}: {}", config.host, config.port, e);
            lifecycle.advance(ServerState::Stopped);
            return Err(e);
        }
    };

    log::info!("🌐 Budget-Pal RESTful API-Server is running on http://{}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);

    serve(server, lifecycle, shutdown_signal()).await
}
