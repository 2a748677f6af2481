//! services/state_store_service.rs
//! State Store: persistencia por país (último estado + bitácoras).
//! El backend primario es un REST estilo PostgREST (Supabase); el
//! alternativo es SQLite local, ver sqlite_store_service.rs.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;

use crate::models::status_model::{
    CountryStatus, LastState, NotificationRecord, StatusCheckRecord,
};
use crate::services::sqlite_store_service::SqliteStateStore;

/// Contrato del State Store. El upsert tiene semántica de merge:
/// `last_notified` en None conserva el valor guardado.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_last_state(&self, country: &str) -> Result<Option<LastState>>;

    async fn upsert_last_state(
        &self,
        country: &str,
        status: CountryStatus,
        last_notified: Option<CountryStatus>,
    ) -> Result<()>;

    async fn insert_status_check(&self, check: &StatusCheckRecord) -> Result<()>;

    async fn insert_notification(&self, notification: &NotificationRecord) -> Result<()>;
}

/// Cliente PostgREST: una URL base + service key en cabeceras.
#[derive(Clone)]
pub struct RestStateStore {
    base_url: String,
    client: Client,
}

impl RestStateStore {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(service_key).context("Service key inválida como header")?,
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", service_key))
                .context("Service key inválida como header")?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()
            .context("No se pudo construir el cliente HTTP del state store")?;

        Ok(RestStateStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl StateStore for RestStateStore {
    async fn get_last_state(&self, country: &str) -> Result<Option<LastState>> {
        let filter = format!("eq.{}", country);
        let resp = self
            .client
            .get(self.rest_url("country_last_state"))
            .query(&[("select", "*"), ("country", filter.as_str())])
            .send()
            .await
            .context("Fallo el GET de country_last_state")?;

        let resp = expect_success(resp, "country_last_state").await?;
        let rows: Vec<LastState> = resp
            .json()
            .await
            .context("Respuesta inválida de country_last_state")?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_last_state(
        &self,
        country: &str,
        status: CountryStatus,
        last_notified: Option<CountryStatus>,
    ) -> Result<()> {
        let mut payload = serde_json::json!({
            "country": country,
            "status": status.as_str(),
            "last_checked_at": Utc::now().to_rfc3339(),
        });
        // Con merge-duplicates, omitir el campo conserva lo guardado.
        if let Some(value) = last_notified {
            payload["last_notified_status"] = serde_json::json!(value.as_str());
        }

        let resp = self
            .client
            .post(self.rest_url("country_last_state"))
            .query(&[("on_conflict", "country")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&payload)
            .send()
            .await
            .context("Fallo el upsert de country_last_state")?;

        expect_success(resp, "country_last_state").await?;
        Ok(())
    }

    async fn insert_status_check(&self, check: &StatusCheckRecord) -> Result<()> {
        let resp = self
            .client
            .post(self.rest_url("status_checks"))
            .header("Prefer", "return=minimal")
            .json(check)
            .send()
            .await
            .context("Fallo el insert de status_checks")?;

        expect_success(resp, "status_checks").await?;
        Ok(())
    }

    async fn insert_notification(&self, notification: &NotificationRecord) -> Result<()> {
        let resp = self
            .client
            .post(self.rest_url("notifications"))
            .header("Prefer", "return=minimal")
            .json(notification)
            .send()
            .await
            .context("Fallo el insert de notifications")?;

        expect_success(resp, "notifications").await?;
        Ok(())
    }
}

async fn expect_success(resp: reqwest::Response, table: &str) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let code = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("Store error en {} ({}): {}", table, code, body))
}

/// Variante elegida por configuración en el arranque.
#[derive(Clone)]
pub enum AnyStateStore {
    Rest(RestStateStore),
    Sqlite(SqliteStateStore),
}

#[async_trait]
impl StateStore for AnyStateStore {
    async fn get_last_state(&self, country: &str) -> Result<Option<LastState>> {
        match self {
            AnyStateStore::Rest(store) => store.get_last_state(country).await,
            AnyStateStore::Sqlite(store) => store.get_last_state(country).await,
        }
    }

    async fn upsert_last_state(
        &self,
        country: &str,
        status: CountryStatus,
        last_notified: Option<CountryStatus>,
    ) -> Result<()> {
        match self {
            AnyStateStore::Rest(store) => {
                store.upsert_last_state(country, status, last_notified).await
            }
            AnyStateStore::Sqlite(store) => {
                store.upsert_last_state(country, status, last_notified).await
            }
        }
    }

    async fn insert_status_check(&self, check: &StatusCheckRecord) -> Result<()> {
        match self {
            AnyStateStore::Rest(store) => store.insert_status_check(check).await,
            AnyStateStore::Sqlite(store) => store.insert_status_check(check).await,
        }
    }

    async fn insert_notification(&self, notification: &NotificationRecord) -> Result<()> {
        match self {
            AnyStateStore::Rest(store) => store.insert_notification(notification).await,
            AnyStateStore::Sqlite(store) => store.insert_notification(notification).await,
        }
    }
}
