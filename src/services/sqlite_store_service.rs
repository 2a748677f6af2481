//! services/sqlite_store_service.rs
//! Variante SQLite del State Store, para despliegues de una sola
//! instancia sin backend externo. Mismas tres tablas que el REST.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::status_model::{
    CountryStatus, LastState, NotificationRecord, StatusCheckRecord,
};
use crate::services::state_store_service::StateStore;

#[derive(Clone)]
pub struct SqliteStateStore {
    db_pool: Pool<Sqlite>,
}

impl SqliteStateStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteStateStore { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo al correr las migraciones del state store")?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get_last_state(&self, country: &str) -> Result<Option<LastState>> {
        let row = sqlx::query(
            r#"
            SELECT status, last_checked_at, last_notified_status
            FROM country_last_state
            WHERE country = ?1
            "#,
        )
        .bind(country)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al leer country_last_state")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: Option<String> = row.try_get("status")?;
        let last_checked_at: Option<String> = row.try_get("last_checked_at")?;
        let last_notified: Option<String> = row.try_get("last_notified_status")?;

        Ok(Some(LastState {
            status: status.as_deref().and_then(CountryStatus::from_label),
            last_checked_at,
            last_notified_status: last_notified.as_deref().and_then(CountryStatus::from_label),
        }))
    }

    async fn upsert_last_state(
        &self,
        country: &str,
        status: CountryStatus,
        last_notified: Option<CountryStatus>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        // Semántica de merge: solo pisamos last_notified_status cuando
        // el caller mandó un valor.
        let last_notified_sql = if last_notified.is_some() {
            ", last_notified_status = excluded.last_notified_status"
        } else {
            ""
        };
        let sql = format!(
            r#"
            INSERT INTO country_last_state (country, status, last_checked_at, last_notified_status)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(country) DO UPDATE SET
                status = excluded.status,
                last_checked_at = excluded.last_checked_at{last_notified_sql}
            "#
        );

        sqlx::query(&sql)
            .bind(country)
            .bind(status.as_str())
            .bind(now)
            .bind(last_notified.map(|s| s.as_str()))
            .execute(&self.db_pool)
            .await
            .context("Fallo el upsert de country_last_state")?;

        Ok(())
    }

    async fn insert_status_check(&self, check: &StatusCheckRecord) -> Result<()> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO status_checks (id, country, status, source_url, raw_excerpt, error, checked_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(id)
        .bind(&check.country)
        .bind(check.status.map(|s| s.as_str()))
        .bind(&check.source_url)
        .bind(&check.raw_excerpt)
        .bind(&check.error)
        .bind(&check.checked_at)
        .execute(&self.db_pool)
        .await
        .context("Fallo el insert de status_checks")?;

        Ok(())
    }

    async fn insert_notification(&self, notification: &NotificationRecord) -> Result<()> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO notifications (id, country, status, recipient, provider, provider_message_id, sent_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(id)
        .bind(&notification.country)
        .bind(notification.status.as_str())
        .bind(&notification.recipient)
        .bind(&notification.provider)
        .bind(&notification.provider_message_id)
        .bind(&notification.sent_at)
        .execute(&self.db_pool)
        .await
        .context("Fallo el insert de notifications")?;

        Ok(())
    }
}
