use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use dotenvy::dotenv;

use medischedule::config::{Config, StoreBackend};
use medischedule::store::{MemoryStore, PgStore, Store, pg};
use medischedule::{logger, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    logger::init_logger(config.log_format);

    let store: Arc<dyn Store> = match &config.backend {
        StoreBackend::Postgres {
            database_url,
            pool_size,
        } => {
            // create db connection pool
            let pool = pg::build_pool(database_url, *pool_size)
                .context("Failed to create database pool")?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    tracing::info!(host = %config.host, port = config.port, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(store.clone()))
            .app_data(routes::json_config())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
