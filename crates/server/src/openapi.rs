//! OpenAPI document, grounded on `server::ApiDoc`'s `#[derive(OpenApi)]`
//! shape but scoped to the surfaces this service actually exposes.

use utoipa::OpenApi;

use crate::http::equipment;

#[derive(OpenApi)]
#[openapi(
    paths(
        equipment::equipment_status_5g,
        equipment::provision_equipment,
        equipment::get_equipment,
        equipment::delete_equipment,
    ),
    components(schemas(equipment::ProvisionEquipmentRequest)),
    tags(
        (name = "5G-EIR", description = "3GPP TS 29.511 equipment status equivalence"),
        (name = "management", description = "Equipment provisioning and lifecycle management")
    ),
    info(
        title = "Equipment Identity Register",
        description = "Diameter S13 ME-Identity-Check core with a 5G HTTP equivalent and a management API",
        version = "0.3.0"
    )
)]
pub struct ApiDoc;
