//! services/email_notifier_service.rs
//! Variante por correo del Notifier: SMTP con lettre, TLS requerido.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::app_config::EmailSettings;
use crate::models::status_model::CountryStatus;
use crate::services::notifier_service::{Notifier, NotifyReceipt};

#[derive(Clone)]
pub struct EmailNotifier {
    settings: EmailSettings,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        EmailNotifier { settings }
    }

    async fn deliver(&self, subject: &str, body_text: &str) -> Result<()> {
        let from: Mailbox = self
            .settings
            .sender
            .clone()
            .unwrap_or_else(|| format!("Caps Monitor <{}>", self.settings.smtp_user))
            .parse()
            .context("Remitente inválido")?;
        let to: Mailbox = self
            .settings
            .recipient
            .parse()
            .context("Destinatario inválido")?;

        let tls_params = TlsParameters::new(self.settings.smtp_host.clone())?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.smtp_host)?
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(
                self.settings.smtp_user.clone(),
                self.settings.smtp_pass.clone(),
            ))
            .tls(Tls::Required(tls_params))
            .build();

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body_text.to_string())?;

        tokio::time::timeout(std::time::Duration::from_secs(30), mailer.send(message))
            .await??;

        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn recipient(&self) -> &str {
        &self.settings.recipient
    }

    async fn send_open_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
    ) -> Result<NotifyReceipt> {
        let subject = format!(
            "{} está {} para el cupo de visas",
            country,
            status.as_str().to_uppercase()
        );
        let body_text = format!(
            "Estado actualizado: {} -> {}\n\nFuente: {}\n\
             Este alerta se envió automáticamente al detectar el cambio de estado.",
            country,
            status.as_str(),
            source_url
        );
        self.deliver(&subject, &body_text).await?;

        // SMTP no devuelve un id de mensaje del proveedor.
        Ok(NotifyReceipt {
            provider: "smtp".to_string(),
            message_id: None,
        })
    }

    async fn send_test_alert(
        &self,
        country: &str,
        source_url: &str,
        status: CountryStatus,
        run_id: &str,
    ) -> Result<NotifyReceipt> {
        let subject = format!("[PRUEBA {}] Monitor de cupos: {}", run_id, country);
        let body_text = format!(
            "Mensaje de prueba del monitor, ignorar.\n\nEstado actual: {} -> {}\nFuente: {}",
            country,
            status.as_str(),
            source_url
        );
        self.deliver(&subject, &body_text).await?;

        Ok(NotifyReceipt {
            provider: "smtp".to_string(),
            message_id: None,
        })
    }
}
