//! Health/readiness/liveness/metrics handlers, carried in shape from
//! `server::{health_check, readiness_check, liveness_check,
//! metrics_handler}` but backed by `RepositoryBackend::ping` instead of a
//! raw `sqlx::PgPool`, and returning the `eir-utils::observability`
//! payload shapes rather than ad hoc JSON.

use actix_web::{web, HttpResponse};
use eir_utils::{ComponentCheck, HealthCheck, HealthStatus};
use prometheus::{Registry, TextEncoder};

use crate::state::AppState;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthCheck::healthy(env!("CARGO_PKG_VERSION").to_string()))
}

/// Readiness probe: pings the repository backend.
pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let db_check = match state.backend.ping().await {
        Ok(()) => ComponentCheck {
            name: "database".to_string(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => {
            log::error!("database readiness check failed: {}", e);
            ComponentCheck {
                name: "database".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
            }
        }
    };

    let health = HealthCheck::from_components(
        env!("CARGO_PKG_VERSION").to_string(),
        vec![db_check],
    );

    if health.status == HealthStatus::Unhealthy {
        HttpResponse::ServiceUnavailable().json(health)
    } else {
        HttpResponse::Ok().json(health)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}

pub async fn metrics_handler(registry: web::Data<Registry>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    match encoder.encode_to_string(&metric_families) {
        Ok(metrics) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(metrics),
        Err(e) => {
            log::error!("failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().body("failed to encode metrics")
        }
    }
}
