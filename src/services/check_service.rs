//! services/check_service.rs
//! Orquestador de una corrida: fetch -> bitácora -> estado -> política de
//! notificación deduplicada. Una corrida por invocación externa, pasos
//! estrictamente secuenciales, sin reintentos propios.
//!
//! Política ante fallos del store: FATAL. Si la escritura de auditoría (o
//! cualquier acceso posterior al store) falla, la corrida se corta con Err;
//! no existe modo degradado sin persistencia.

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::models::check_model::CheckResult;
use crate::models::status_model::{CountryStatus, NotificationRecord, StatusCheckRecord};
use crate::services::notifier_service::{AnyNotifier, Notifier, NotifyReceipt};
use crate::services::state_store_service::{AnyStateStore, StateStore};
use crate::services::status_source_service::{HttpStatusSource, StatusSource};

/// El tipo concreto que viaja en el app_data de actix.
pub type AppCheckService = CheckService<HttpStatusSource, AnyStateStore, AnyNotifier>;

#[derive(Clone)]
pub struct CheckService<S, St, N> {
    target_country: String,
    source_url: String,
    source: S,
    store: St,
    notifier: N,
}

impl<S, St, N> CheckService<S, St, N>
where
    S: StatusSource,
    St: StateStore,
    N: Notifier,
{
    pub fn new(
        target_country: String,
        source_url: String,
        source: S,
        store: St,
        notifier: N,
    ) -> Self {
        CheckService {
            target_country,
            source_url,
            source,
            store,
            notifier,
        }
    }

    pub async fn run_check(&self, force_test: bool) -> Result<CheckResult> {
        log::info!(
            "(run_check) Iniciando chequeo para '{}' (test={})",
            self.target_country,
            force_test
        );

        // 1) Fetch: errores de transporte y de parseo llegan como dato.
        let outcome = self.source.fetch_status(&self.target_country).await;

        // 2) Bitácora de auditoría: se escribe SIEMPRE, haya salido lo que
        // haya salido del fetch.
        let check = StatusCheckRecord {
            country: self.target_country.clone(),
            status: outcome.status,
            source_url: self.source_url.clone(),
            raw_excerpt: outcome.raw_excerpt.clone(),
            error: outcome.error.clone(),
            checked_at: Utc::now().to_rfc3339(),
        };
        self.store
            .insert_status_check(&check)
            .await
            .context("Fallo al registrar el status_check")?;

        // 3) Sin estado utilizable la corrida termina acá: no se toca
        // country_last_state ni se notifica.
        let status = match outcome.status {
            Some(status) if outcome.error.is_none() => status,
            other => {
                let error = outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| "status_empty".to_string());
                log::warn!("(run_check) Chequeo sin estado utilizable: {}", error);
                return Ok(CheckResult {
                    status: other,
                    previous_status: None,
                    changed: false,
                    notified: false,
                    provider: None,
                    provider_message_id: None,
                    raw_excerpt: outcome.raw_excerpt,
                    action: Some("logged_error"),
                    error: Some(error),
                    notify_error: None,
                    mode: "live",
                    test_mode: force_test,
                });
            }
        };

        // 4) Estado previo (fila ausente = todo en None).
        let last = self
            .store
            .get_last_state(&self.target_country)
            .await
            .context("Fallo al leer country_last_state")?;
        let previous_status = last.as_ref().and_then(|l| l.status);
        let last_notified_status = last.as_ref().and_then(|l| l.last_notified_status);

        // 5) Upsert del estado observado; last_notified_status pasa tal
        // cual se leyó (el paso 6 lo puede pisar tras notificar).
        self.store
            .upsert_last_state(&self.target_country, status, last_notified_status)
            .await
            .context("Fallo al actualizar country_last_state")?;

        let changed = previous_status != Some(status);
        let mut notified = false;
        let mut provider = None;
        let mut provider_message_id = None;
        let mut notify_error = None;

        // 6) Política de notificación. Camino de prueba y camino vivo son
        // mutuamente excluyentes dentro de una corrida.
        if force_test {
            let run_id: String = Uuid::new_v4().simple().to_string()[..8].to_string();
            log::info!(
                "(run_check) Modo prueba: enviando notificación de test (run_id={})",
                run_id
            );
            match self
                .notifier
                .send_test_alert(&self.target_country, &self.source_url, status, &run_id)
                .await
            {
                Ok(receipt) => {
                    self.record_notification(status, &receipt).await?;
                    notified = true;
                    provider = Some(receipt.provider);
                    provider_message_id = receipt.message_id;
                }
                Err(e) => {
                    log::error!("(run_check) Falló la notificación de prueba: {:?}", e);
                    notify_error = Some(format!("{:?}", e));
                }
            }
        } else if status == CountryStatus::Open
            && (previous_status != Some(CountryStatus::Open)
                || last_notified_status != Some(CountryStatus::Open))
        {
            log::info!(
                "(run_check) Transición a 'open' (previo={:?}, último notificado={:?}); notificando...",
                previous_status,
                last_notified_status
            );
            match self
                .notifier
                .send_open_alert(&self.target_country, &self.source_url, status)
                .await
            {
                Ok(receipt) => {
                    self.record_notification(status, &receipt).await?;
                    // Solo un envío exitoso avanza last_notified_status.
                    self.store
                        .upsert_last_state(
                            &self.target_country,
                            status,
                            Some(CountryStatus::Open),
                        )
                        .await
                        .context("Fallo al actualizar last_notified_status")?;
                    notified = true;
                    provider = Some(receipt.provider);
                    provider_message_id = receipt.message_id;
                }
                Err(e) => {
                    // last_notified_status queda como estaba: la próxima
                    // corrida reintenta el aviso.
                    log::error!("(run_check) Falló el envío de la alerta: {:?}", e);
                    notify_error = Some(format!("{:?}", e));
                }
            }
        } else {
            log::info!(
                "(run_check) Sin notificación (status={}, previo={:?}, último notificado={:?})",
                status,
                previous_status,
                last_notified_status
            );
        }

        // 7) Resultado plano de la corrida.
        Ok(CheckResult {
            status: Some(status),
            previous_status,
            changed,
            notified,
            provider,
            provider_message_id,
            raw_excerpt: outcome.raw_excerpt,
            action: None,
            error: None,
            notify_error,
            mode: "live",
            test_mode: force_test,
        })
    }

    async fn record_notification(
        &self,
        status: CountryStatus,
        receipt: &NotifyReceipt,
    ) -> Result<()> {
        self.store
            .insert_notification(&NotificationRecord {
                country: self.target_country.clone(),
                status,
                recipient: self.notifier.recipient().to_string(),
                provider: receipt.provider.clone(),
                provider_message_id: receipt.message_id.clone(),
                sent_at: Utc::now().to_rfc3339(),
            })
            .await
            .context("Fallo al registrar la notificación")
    }
}
