use axum::extract::rejection::JsonRejection;
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;

/// Parse an id taken from the URL so a malformed one is a JSON 400 rather
/// than axum's plain-text rejection.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} id: {}", what, raw)))
}

/// Unwrap a JSON body, reporting malformed payloads in the error envelope.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "platform").unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids_as_bad_request() {
        let err = parse_id("12345", "platform").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid platform id: 12345");
    }
}
