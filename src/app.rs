//! app.rs
use crate::handlers::check_handler;
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/check", web::post().to(check_handler::run_check_endpoint))
        .route("/health", web::get().to(check_handler::health_endpoint))
        .route("/config", web::get().to(check_handler::config_endpoint));
}
