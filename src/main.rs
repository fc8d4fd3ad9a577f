use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use fatigue_backend::{handlers, AppConfig, ModelStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = match ModelStore::load(&config.model) {
        Ok(store) => store,
        Err(e) => {
            error!(
                path = %config.model.model_path().display(),
                error = %e,
                "Error loading model, make sure the model file is in place"
            );
            return Err(e).context("Failed to load model");
        }
    };
    info!(
        variant = store.variant().as_str(),
        loaded = store.is_loaded(),
        "Model store ready"
    );

    let store = web::Data::new(store);
    let bind = (config.server.host.clone(), config.server.port);
    info!("Server running at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(handlers::cors())
            .app_data(store.clone())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
