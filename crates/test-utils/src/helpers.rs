//! Test helper functions

use actix_web::test;

/// Build an HTTP test request for the equipment surfaces, without the
/// bearer-token scaffolding TMF-style services carry: no auth layer is
/// named anywhere in this service's interface.
pub fn create_test_request(method: &str, path: &str, body: Option<&str>) -> test::TestRequest {
    use actix_web::http::Method;

    let mut req = test::TestRequest::default()
        .method(Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET))
        .uri(path)
        .insert_header(("Content-Type", "application/json"));

    if let Some(body_str) = body {
        req = req.set_payload(body_str.to_string());
    }

    req
}

/// Assert JSON response structure
pub fn assert_json_response(
    response: &str,
    expected_fields: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let json: serde_json::Value = serde_json::from_str(response)?;

    if let Some(obj) = json.as_object() {
        for field in expected_fields {
            if !obj.contains_key(*field) {
                return Err(format!("Missing expected field: {}", field).into());
            }
        }
    } else {
        return Err("Response is not a JSON object".into());
    }

    Ok(())
}
