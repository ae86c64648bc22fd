//! Integration test helpers for the equipment-status HTTP surfaces.

use crate::fixtures;
use crate::helpers;
use actix_web::{test, App};
use eir_repository::EquipmentStatus;
use sqlx::PgPool;

/// Test configuration for integration tests backed by a real database.
pub struct TestConfig {
    pub pool: PgPool,
    pub base_url: String,
}

/// Setup a bare test application carrying just a database handle. Route
/// configuration is the caller's job: this crate has no opinion on which
/// `AppState` the service under test wires up.
pub async fn setup_test_app(
    pool: PgPool,
) -> App<
    impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
            Error = actix_web::Error,
            InitError = (),
        > + 'static,
> {
    App::new().app_data(actix_web::web::Data::new(pool))
}

/// Test helpers for the 5G equivalence surface (`/n5g-eir-eic/v1/equipment-status`).
pub mod equipment_status_tests {
    use super::*;

    /// Check an IMEI against the 5G equivalence surface and return its status.
    pub async fn test_check_equipment_status(
        app: App<
            impl actix_web::dev::ServiceFactory<
                    actix_web::dev::ServiceRequest,
                    Config = (),
                    Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
                    Error = actix_web::Error,
                    InitError = (),
                > + 'static,
        >,
        imei: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let req = helpers::create_test_request(
            "GET",
            &format!("/n5g-eir-eic/v1/equipment-status?pei={}", imei),
            None,
        );

        let service = test::init_service(app).await;
        let resp = test::call_service(&service, req.to_request()).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body)?;

        let status = json["status"]
            .as_str()
            .ok_or("Missing status in equipment-status response")?;
        Ok(status.to_string())
    }
}

/// Test helpers for the management API (`/equipment`).
pub mod management_tests {
    use super::*;

    /// Provision an equipment record and return its assigned id.
    pub async fn test_provision_equipment(
        app: App<
            impl actix_web::dev::ServiceFactory<
                    actix_web::dev::ServiceRequest,
                    Config = (),
                    Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
                    Error = actix_web::Error,
                    InitError = (),
                > + 'static,
        >,
        imei: &str,
        status: EquipmentStatus,
    ) -> Result<uuid::Uuid, Box<dyn std::error::Error>> {
        let body = fixtures::provision_equipment_json(imei, status);
        let req = helpers::create_test_request("POST", "/equipment", Some(&body.to_string()));

        let service = test::init_service(app).await;
        let resp = test::call_service(&service, req.to_request()).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body)?;

        let id_str = json["id"].as_str().ok_or("Missing id in provision response")?;
        Ok(uuid::Uuid::parse_str(id_str)?)
    }

    /// Fetch an equipment record by IMEI and assert it carries the expected status.
    pub async fn test_get_equipment(
        app: App<
            impl actix_web::dev::ServiceFactory<
                    actix_web::dev::ServiceRequest,
                    Config = (),
                    Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
                    Error = actix_web::Error,
                    InitError = (),
                > + 'static,
        >,
        imei: &str,
        expected_status: EquipmentStatus,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let req = helpers::create_test_request("GET", &format!("/equipment/{}", imei), None);

        let service = test::init_service(app).await;
        let resp = test::call_service(&service, req.to_request()).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["imei"].as_str().unwrap(), imei);
        assert_eq!(json["status"].as_str().unwrap(), expected_status.to_string());
        Ok(())
    }

    /// List equipment filtered by status and assert the response is an array.
    pub async fn test_list_equipment(
        app: App<
            impl actix_web::dev::ServiceFactory<
                    actix_web::dev::ServiceRequest,
                    Config = (),
                    Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
                    Error = actix_web::Error,
                    InitError = (),
                > + 'static,
        >,
        status: EquipmentStatus,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let req = helpers::create_test_request(
            "GET",
            &format!("/equipment?status={}", status),
            None,
        );

        let service = test::init_service(app).await;
        let resp = test::call_service(&service, req.to_request()).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert!(json.is_array() || json["data"].is_array());
        Ok(())
    }
}

/// Test helpers for the audit/history surface (`/equipment/{imei}/history`).
pub mod audit_tests {
    use super::*;

    /// Fetch an IMEI's change history and assert at least one entry exists.
    pub async fn test_get_equipment_history(
        app: App<
            impl actix_web::dev::ServiceFactory<
                    actix_web::dev::ServiceRequest,
                    Config = (),
                    Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
                    Error = actix_web::Error,
                    InitError = (),
                > + 'static,
        >,
        imei: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let req =
            helpers::create_test_request("GET", &format!("/equipment/{}/history", imei), None);

        let service = test::init_service(app).await;
        let resp = test::call_service(&service, req.to_request()).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        let entries = json["data"].as_array().or_else(|| json.as_array());
        assert!(entries.map(|a| !a.is_empty()).unwrap_or(false));
        Ok(())
    }
}
