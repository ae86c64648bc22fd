//! The 5G HTTP equivalence endpoint and the management API, grounded on
//! `tmf629_customer::handlers`'s `#[utoipa::path]` + `ActixResult<HttpResponse>`
//! style (`get_customers`/`get_customer_by_id`/`create_customer`).

use std::time::Instant;

use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use eir_core::{CheckEquipmentRequest, EirError, EquipmentDecisionEngine};
use eir_repository::{ChangeType, Equipment, EquipmentStatus, RequestSource, TransportMeta};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EquipmentStatusQuery {
    pei: String,
}

/// `GET /n5g-eir-eic/v1/equipment-status?pei=<imei>`
#[utoipa::path(
    get,
    path = "/n5g-eir-eic/v1/equipment-status",
    params(("pei" = String, Query, description = "Permanent Equipment Identifier (IMEI)")),
    responses(
        (status = 200, description = "Equipment status resolved"),
        (status = 400, description = "Malformed PEI"),
        (status = 503, description = "Backend unavailable")
    ),
    tag = "5G-EIR"
)]
pub async fn equipment_status_5g(
    state: web::Data<AppState>,
    query: web::Query<EquipmentStatusQuery>,
    http_req: HttpRequest,
) -> ActixResult<HttpResponse> {
    let started = Instant::now();

    let request = CheckEquipmentRequest {
        imei: query.pei.clone(),
        request_source: RequestSource::Http5g,
        supi: None,
        gpsi: None,
        session_id: None,
        origin_host: None,
        origin_realm: None,
        transport: Some(TransportMeta {
            ip_address: http_req.peer_addr().map(|a| a.ip().to_string()),
            user_agent: http_req
                .headers()
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string()),
            processing_time_ms: 0,
            additional_data: None,
        }),
    };

    let result = state.engine.check_equipment(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    match &result {
        Ok(response) => {
            state
                .metrics
                .equipment_check_total
                .with_label_values(&["HTTP_5G", &response.status.to_string()])
                .inc();
            state
                .metrics
                .equipment_check_duration
                .with_label_values(&["HTTP_5G", &response.status.to_string()])
                .observe(elapsed);
        }
        Err(_) => {
            state
                .metrics
                .equipment_check_total
                .with_label_values(&["HTTP_5G", "ERROR"])
                .inc();
        }
    }

    match result {
        Ok(response) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": response.status.to_string(),
        }))),
        Err(e) => Ok(http_error_response(&e)),
    }
}

/// Maps `EirError` to the HTTP status this surface answers with. The
/// Diameter-layer equivalent lives in `eir_codec::result_code_for_reason`;
/// the two never share a representation, per the error taxonomy's rule
/// that wire encodings don't leak across components.
fn http_error_response(err: &EirError) -> HttpResponse {
    match err {
        EirError::InvalidImei(msg) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }))
        }
        EirError::MissingAvp(msg) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }))
        }
        EirError::RepositoryTransient(_)
        | EirError::RepositoryFatal(_)
        | EirError::UpstreamUnavailable(_)
        | EirError::Timeout
        | EirError::CancellationRequested
        | EirError::ProtocolError(_) => HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "error": err.to_string() })),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProvisionEquipmentRequest {
    pub imei: String,
    #[schema(value_type = String, example = "WHITELISTED")]
    pub status: EquipmentStatus,
    pub reason: Option<String>,
    pub added_by: String,
}

/// `POST /equipment`
#[utoipa::path(
    post,
    path = "/equipment",
    request_body = ProvisionEquipmentRequest,
    responses(
        (status = 201, description = "Equipment provisioned"),
        (status = 400, description = "Invalid IMEI")
    ),
    tag = "management"
)]
pub async fn provision_equipment(
    state: web::Data<AppState>,
    body: web::Json<ProvisionEquipmentRequest>,
) -> ActixResult<HttpResponse> {
    let imei = match eir_core::Imei::new(&body.imei) {
        Ok(imei) => imei,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    };

    let equipment = Equipment {
        id: Uuid::new_v4(),
        imei: imei.as_str().to_string(),
        status: body.status,
        added_by: body.added_by.clone(),
        last_updated: Utc::now(),
        check_count: 0,
        manufacturer_tac: Equipment::tac_from_imei(imei.as_str()),
        manufacturer_name: None,
        reason: body.reason.clone(),
        metadata: None,
    };

    match state.backend.create(equipment).await {
        Ok(created) => {
            if let Err(e) = state
                .audit
                .record_mutation(
                    &created.imei,
                    ChangeType::Create,
                    &created.added_by,
                    None,
                    Some(created.status),
                    created.reason.clone(),
                )
                .await
            {
                log::warn!("failed to record provisioning history for {}: {}", created.imei, e);
            }
            Ok(HttpResponse::Created().json(created))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

/// `GET /equipment/{imei}`
#[utoipa::path(
    get,
    path = "/equipment/{imei}",
    params(("imei" = String, Path, description = "Equipment IMEI")),
    responses(
        (status = 200, description = "Equipment found"),
        (status = 404, description = "Equipment not found")
    ),
    tag = "management"
)]
pub async fn get_equipment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let imei = path.into_inner();
    match state.backend.get_by_imei(&imei).await {
        Ok(Some(equipment)) => Ok(HttpResponse::Ok().json(equipment)),
        Ok(None) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("no equipment provisioned for imei {}", imei)
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

/// `DELETE /equipment/{imei}`
#[utoipa::path(
    delete,
    path = "/equipment/{imei}",
    params(("imei" = String, Path, description = "Equipment IMEI")),
    responses(
        (status = 204, description = "Equipment removed"),
        (status = 404, description = "Equipment not found")
    ),
    tag = "management"
)]
pub async fn delete_equipment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let imei = path.into_inner();

    let existing = match state.backend.get_by_imei(&imei).await {
        Ok(Some(equipment)) => equipment,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("no equipment provisioned for imei {}", imei)
            })))
        }
        Err(e) => {
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    };

    match state.backend.delete(&imei).await {
        Ok(()) => {
            if let Err(e) = state
                .audit
                .record_mutation(
                    &imei,
                    ChangeType::Delete,
                    "management-api",
                    Some(existing.status),
                    None,
                    None,
                )
                .await
            {
                log::warn!("failed to record deletion history for {}: {}", imei, e);
            }
            Ok(HttpResponse::NoContent().finish())
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}
