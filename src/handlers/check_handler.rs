use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::{
    config::app_config::AppConfig,
    models::check_model::CheckRequest,
    services::check_service::AppCheckService,
};

/// POST /check
/// Dispara una corrida. El body es opcional; el camino de prueba exige
/// además el token de test configurado.
pub async fn run_check_endpoint(
    req: HttpRequest,
    body: Option<web::Json<CheckRequest>>,
    config: web::Data<AppConfig>,
    check_service: web::Data<AppCheckService>,
) -> HttpResponse {
    // Auth del trigger: comparación exacta contra "Bearer <token>".
    if let Some(expected) = &config.worker_auth {
        let authorized = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {}", expected))
            .unwrap_or(false);
        if !authorized {
            return HttpResponse::Unauthorized().json(json!({
                "success": false,
                "error": "Unauthorized"
            }));
        }
    }

    let req_body = body.map(|b| b.into_inner()).unwrap_or_default();

    if req_body.force_notify_test {
        let configured = config.test_notify_token.as_deref();
        if configured.is_none() || configured != req_body.test_notify_token.as_deref() {
            return HttpResponse::Unauthorized().json(json!({
                "success": false,
                "error": "Invalid test_notify_token"
            }));
        }
    }

    match check_service.run_check(req_body.force_notify_test).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => {
            log::error!("(run_check_endpoint) La corrida falló: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": format!("{:?}", e)
            }))
        }
    }
}

/// GET /health
pub async fn health_endpoint() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// GET /config
/// Presencia de la configuración opcional/secreta, nunca los valores.
pub async fn config_endpoint(config: web::Data<AppConfig>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "target_country": config.target_country,
        "source_url_present": true,
        "worker_auth_present": config.worker_auth.is_some(),
        "test_notify_token_present": config.test_notify_token.is_some(),
        "state_store": config.store_kind(),
        "notify_channel": config.notify_channel(),
    }))
}
