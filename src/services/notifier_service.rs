//! services/notifier_service.rs
//! Notifier: entrega la alerta a un destinatario fijo. Dos variantes
//! detrás del mismo contrato (Telegram y correo SMTP); se elige una por
//! despliegue vía configuración, nunca duplicando el orquestador.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::models::status_model::CountryStatus;
use crate::services::email_notifier_service::EmailNotifier;

/// Lo que devuelve un envío exitoso: el proveedor y, si el canal lo da,
/// el id de mensaje que asignó.
#[derive(Debug, Clone)]
pub struct NotifyReceipt {
    pub provider: String,
    pub message_id: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn recipient(&self) -> &str;

    async fn send_open_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
    ) -> Result<NotifyReceipt>;

    /// Alerta de prueba, etiquetada con el run id para distinguirla.
    async fn send_test_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
        run_id: &str,
    ) -> Result<NotifyReceipt>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("No se pudo construir el cliente HTTP de Telegram")?;

        Ok(TelegramNotifier {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            client,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    async fn send_message(&self, text: &str) -> Result<Option<String>> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .context("Fallo el POST a sendMessage")?;

        let code = resp.status();
        if !code.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Telegram error {}: {}", code, body));
        }

        let json_val = resp.json::<serde_json::Value>().await?;
        let message_id = json_val
            .get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(|v| v.as_i64())
            .map(|id| id.to_string());
        Ok(message_id)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn recipient(&self) -> &str {
        &self.chat_id
    }

    async fn send_open_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
    ) -> Result<NotifyReceipt> {
        let text = format!(
            "{} está {} para el cupo de visas. Este alerta se envió \
             automáticamente al detectar el cambio de estado.",
            country,
            status.as_str().to_uppercase()
        );
        let message_id = self.send_message(&text).await?;

        // Mensaje secundario con el link, best-effort: si falla no toca
        // el resultado del envío principal.
        if let Err(e) = self.send_message(&format!("Fuente: {}", source_url)).await {
            log::warn!("(send_open_alert) No se pudo mandar el link de la fuente: {:?}", e);
        }

        Ok(NotifyReceipt {
            provider: "telegram".to_string(),
            message_id,
        })
    }

    async fn send_test_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
        run_id: &str,
    ) -> Result<NotifyReceipt> {
        let text = format!(
            "[PRUEBA {}] {} está {}. Mensaje de prueba del monitor, ignorar.\nFuente: {}",
            run_id,
            country,
            status.as_str().to_uppercase(),
            source_url
        );
        let message_id = self.send_message(&text).await?;

        Ok(NotifyReceipt {
            provider: "telegram".to_string(),
            message_id,
        })
    }
}

/// Variante elegida por configuración en el arranque.
#[derive(Clone)]
pub enum AnyNotifier {
    Telegram(TelegramNotifier),
    Email(EmailNotifier),
}

#[async_trait]
impl Notifier for AnyNotifier {
    fn recipient(&self) -> &str {
        match self {
            AnyNotifier::Telegram(n) => n.recipient(),
            AnyNotifier::Email(n) => n.recipient(),
        }
    }

    async fn send_open_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
    ) -> Result<NotifyReceipt> {
        match self {
            AnyNotifier::Telegram(n) => n.send_open_alert(country, source_url, status).await,
            AnyNotifier::Email(n) => n.send_open_alert(country, source_url, status).await,
        }
    }

    async fn send_test_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
        run_id: &str,
    ) -> Result<NotifyReceipt> {
        match self {
            AnyNotifier::Telegram(n) => {
                n.send_test_alert(country, source_url, status, run_id).await
            }
            AnyNotifier::Email(n) => n.send_test_alert(country, source_url, status, run_id).await,
        }
    }
}
