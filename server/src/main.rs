use std::io;

use actix_web::HttpServer;
use env_logger::Env;
use tasklist_server::{app, Config, TaskStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let store = TaskStore::connect(&config.database_url)
        .await
        .map_err(io::Error::other)?;
    store.migrate().await.map_err(io::Error::other)?;
    if config.seed_sample_data {
        let seeded = store.seed_sample_tasks().await.map_err(io::Error::other)?;
        log::info!("Inserted {seeded} sample tasks");
    }

    let (host, port) = config.bind_address();
    log::info!("Server is running on {host}:{port}");

    let server_store = store.clone();
    let frontend_url = config.frontend_url.clone();
    HttpServer::new(move || app(server_store.clone(), &frontend_url))
        .bind((host, port))?
        .run()
        .await?;

    store.close().await;
    Ok(())
}
