use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use foodgram::app_config;
use foodgram::db::init_db;
use foodgram::middleware::ClientCtx;
use foodgram::storage::{local::LocalStorage, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = app_config::get_config();
    let db = init_db(&config.database).await.map_err(|e| {
        log::error!("Database failed to initialize: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let media_root = PathBuf::from(&config.media.root);
    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorage::new(media_root.clone())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );
    let media_url = config.media.url.trim_end_matches('/').to_owned();

    let mut server = HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::from(storage.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(ClientCtx::default())
            .wrap(Logger::new("%a \"%r\" %s %Dms"))
            .configure(foodgram::web::configure)
            .service(actix_files::Files::new(&media_url, &media_root))
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    log::info!("Listening on {}", config.server.bind);
    server.bind(&config.server.bind)?.run().await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
