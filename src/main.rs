mod api;
mod config;
mod middleware;
mod models;
mod server;
mod store;
mod utils;

use dotenv::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    log::info!("🚀 Starting Budget-Pal...");
    log::info!("🎲 Id strategy: {:?}", config.id_strategy);
    log::info!("⏱️  Shutdown grace period: {}s", config.shutdown_timeout.as_secs());

    server::run(config).await
}
