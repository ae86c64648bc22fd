//! HTTP surfaces: the 5G equivalence endpoint, the management API, and the
//! health/readiness/metrics trio, all `actix-web` services in the
//! teacher's handler style.

pub mod equipment;
pub mod health;

use actix_web::web;

/// Mounted under the app root; mirrors `server::main`'s flat
/// `.route(...)` registrations for the peripheral endpoints plus a
/// `configure_routes`-style scope for the equipment surfaces.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/ready", web::get().to(health::readiness_check))
        .route("/live", web::get().to(health::liveness_check))
        .route("/metrics", web::get().to(health::metrics_handler))
        .route(
            "/n5g-eir-eic/v1/equipment-status",
            web::get().to(equipment::equipment_status_5g),
        )
        .service(
            web::resource("/equipment")
                .route(web::post().to(equipment::provision_equipment)),
        )
        .service(
            web::resource("/equipment/{imei}")
                .route(web::get().to(equipment::get_equipment))
                .route(web::delete().to(equipment::delete_equipment)),
        );
}
