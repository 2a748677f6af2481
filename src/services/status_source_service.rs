//! services/status_source_service.rs
//! Status Source: baja la página de cupos y extrae el estado del país.
//! Los fallos de transporte y de parseo NO se propagan como Err; viajan
//! como dato en el FetchOutcome y el orquestador decide qué hacer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;

use crate::models::status_model::FetchOutcome;
use crate::scrape::parse_country_status;

/// Contrato del Status Source.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, country: &str) -> FetchOutcome;
}

/// Reintentos acotados, solo sobre el GET (es idempotente).
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;

#[derive(Clone)]
pub struct HttpStatusSource {
    source_url: String,
    client: Client,
}

impl HttpStatusSource {
    pub fn new(source_url: &str) -> Result<Self> {
        // La página del gobierno corta clientes sin cabeceras de navegador.
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/121.0 Safari/537.36",
            ),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-AU,en;q=0.9,pt-BR;q=0.8"),
        );
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://immi.homeaffairs.gov.au/what-we-do/whm-program/"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .context("No se pudo construir el cliente HTTP del status source")?;

        Ok(HttpStatusSource {
            source_url: source_url.to_string(),
            client,
        })
    }

    /// GET con reintentos y backoff sobre errores 5xx y de transporte.
    /// Devuelve el error ya formateado como string del run.
    async fn fetch_html(&self) -> Result<String, String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let failure = match self.client.get(&self.source_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp.text().await.map_err(|e| format!("HTTP error: {}", e));
                }
                Ok(resp) => {
                    let code = resp.status();
                    if !code.is_server_error() {
                        // 4xx no se reintenta
                        return Err(format!("HTTP error: status {}", code));
                    }
                    format!("HTTP error: status {}", code)
                }
                Err(e) => format!("HTTP error: {}", e),
            };

            if attempt >= MAX_ATTEMPTS {
                return Err(failure);
            }
            let backoff = Duration::from_millis(BACKOFF_BASE_MS * u64::from(1u32 << (attempt - 1)));
            log::warn!(
                "(fetch_html) Intento {}/{} falló ({}); reintentando en {:?}",
                attempt,
                MAX_ATTEMPTS,
                failure,
                backoff
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, country: &str) -> FetchOutcome {
        match self.fetch_html().await {
            Ok(html) => {
                let (status, raw_excerpt, error) = parse_country_status(&html, country);
                FetchOutcome {
                    status,
                    raw_excerpt,
                    error,
                }
            }
            Err(fetch_error) => FetchOutcome {
                status: None,
                raw_excerpt: None,
                error: Some(fetch_error),
            },
        }
    }
}
