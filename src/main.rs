use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::{Pool, Sqlite};

use crate::config::app_config::{AppConfig, NotifierConfig, StoreConfig};
use crate::logger::init_logger;
use crate::services::check_service::CheckService;
use crate::services::email_notifier_service::EmailNotifier;
use crate::services::notifier_service::{AnyNotifier, TelegramNotifier};
use crate::services::sqlite_store_service::SqliteStateStore;
use crate::services::state_store_service::{AnyStateStore, RestStateStore};
use crate::services::status_source_service::HttpStatusSource;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod scrape;
mod services;
#[cfg(test)]
mod tests;

async fn setup_sqlite(db_path: &str) -> Pool<Sqlite> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .expect("No se pudo crear el directorio de la base de datos");
        }
    }

    // mode=rwc: crea el archivo si no existe
    let db_url = format!("sqlite:{}?mode=rwc", db_path);
    log::info!("Conectando a SQLite en {}", db_url);

    Pool::<Sqlite>::connect(&db_url)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env().expect("Configuración inválida");

    // State store según despliegue
    let store = match &config.store {
        StoreConfig::Rest {
            base_url,
            service_key,
        } => AnyStateStore::Rest(
            RestStateStore::new(base_url, service_key)
                .expect("No se pudo inicializar el state store REST"),
        ),
        StoreConfig::Sqlite { db_path } => {
            let db_pool = setup_sqlite(db_path).await;
            let sqlite_store = SqliteStateStore::new(db_pool);
            if let Err(e) = sqlite_store.run_migrations().await {
                panic!("Fallo en migraciones del state store: {:?}", e);
            }
            AnyStateStore::Sqlite(sqlite_store)
        }
    };

    // Canal de notificación según despliegue
    let notifier = match &config.notifier {
        NotifierConfig::Telegram { bot_token, chat_id } => AnyNotifier::Telegram(
            TelegramNotifier::new(bot_token, chat_id)
                .expect("No se pudo inicializar el notifier de Telegram"),
        ),
        NotifierConfig::Email(settings) => AnyNotifier::Email(EmailNotifier::new(settings.clone())),
    };

    let source = HttpStatusSource::new(&config.source_url)
        .expect("No se pudo inicializar el status source");

    let check_service = CheckService::new(
        config.target_country.clone(),
        config.source_url.clone(),
        source,
        store,
        notifier,
    );

    let bind_addr = ("0.0.0.0", config.port);
    log::info!(
        "Levantando servidor en {}:{} (store={}, canal={})",
        bind_addr.0,
        bind_addr.1,
        config.store_kind(),
        config.notify_channel()
    );

    let config_data = web::Data::new(config);
    let service_data = web::Data::new(check_service);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(service_data.clone())
            .configure(app::init_app)
    })
    .workers(1)
    .bind(bind_addr)?
    .run()
    .await
}
