//! config/app_config.rs
//! Configuración global del monitor. Se lee UNA sola vez del entorno al
//! arrancar el proceso; los colaboradores reciben sus valores por
//! constructor y nunca consultan env directamente.

use anyhow::{bail, Context, Result};
use std::env;

pub const DEFAULT_SOURCE_URL: &str =
    "https://immi.homeaffairs.gov.au/what-we-do/whm-program/status-of-country-caps";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub source_url: String,
    pub target_country: String,
    /// Token bearer de POST /check; sin configurar no hay auth.
    pub worker_auth: Option<String>,
    /// Secreto aparte que exige el camino de notificación de prueba.
    pub test_notify_token: Option<String>,
    pub store: StoreConfig,
    pub notifier: NotifierConfig,
}

/// Backend de persistencia, uno por despliegue.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Rest { base_url: String, service_key: String },
    Sqlite { db_path: String },
}

/// Canal de notificación, uno por despliegue.
#[derive(Debug, Clone)]
pub enum NotifierConfig {
    Telegram { bot_token: String, chat_id: String },
    Email(EmailSettings),
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub recipient: String,
    pub sender: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<AppConfig> {
        let port = match optional("PORT") {
            Some(raw) => raw.parse::<u16>().context("PORT inválido")?,
            None => 8000,
        };
        let source_url = optional("SOURCE_URL").unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let target_country = optional("TARGET_COUNTRY").unwrap_or_else(|| "Brazil".to_string());

        let store = match optional("STATE_STORE").as_deref() {
            None | Some("rest") => StoreConfig::Rest {
                base_url: required("SUPABASE_URL")?,
                service_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            },
            Some("sqlite") => StoreConfig::Sqlite {
                db_path: optional("STATE_DB_PATH")
                    .unwrap_or_else(|| "data/caps_monitor.db".to_string()),
            },
            Some(other) => bail!("STATE_STORE desconocido: {}", other),
        };

        let notifier = match optional("NOTIFY_CHANNEL").as_deref() {
            None | Some("telegram") => NotifierConfig::Telegram {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                chat_id: required("TELEGRAM_CHAT_ID")?,
            },
            Some("email") => NotifierConfig::Email(EmailSettings {
                smtp_host: required("SMTP_HOST")?,
                smtp_port: match optional("SMTP_PORT") {
                    Some(raw) => raw.parse::<u16>().context("SMTP_PORT inválido")?,
                    None => 587,
                },
                smtp_user: required("SMTP_USER")?,
                smtp_pass: required("SMTP_PASS")?,
                recipient: required("ALERT_RECIPIENT_EMAIL")?,
                sender: optional("ALERT_SENDER_EMAIL"),
            }),
            Some(other) => bail!("NOTIFY_CHANNEL desconocido: {}", other),
        };

        Ok(AppConfig {
            port,
            source_url,
            target_country,
            worker_auth: optional("WORKER_AUTH"),
            test_notify_token: optional("TEST_NOTIFY_TOKEN"),
            store,
            notifier,
        })
    }

    pub fn store_kind(&self) -> &'static str {
        match self.store {
            StoreConfig::Rest { .. } => "rest",
            StoreConfig::Sqlite { .. } => "sqlite",
        }
    }

    pub fn notify_channel(&self) -> &'static str {
        match self.notifier {
            NotifierConfig::Telegram { .. } => "telegram",
            NotifierConfig::Email(_) => "email",
        }
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &str) -> Result<String> {
    optional(name).with_context(|| format!("Falta la variable de entorno {}", name))
}
