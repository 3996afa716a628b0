//! # Custom Extractors & Validation
//!
//! Request bodies arrive as loosely-typed DTOs and are converted into domain
//! inputs through the [`Validate`] trait, so handlers only ever see values
//! that already passed every field rule.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use skillswap_core::{SwapRequestId, ValidationError};

use crate::error::AppError;

/// Conversion from a request DTO into its validated domain form.
pub trait Validate {
    /// The validated value handlers work with.
    type Validated;

    /// Check every field rule and build the validated value.
    fn validate(self) -> Result<Self::Validated, ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and convert it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Validated, AppError> {
    let value = extract_json(result)?;
    Ok(value.validate()?)
}

/// Extract query parameters, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a swap request id taken from the path.
///
/// A malformed id is rejected before any lookup.
pub fn parse_request_id(raw: &str) -> Result<SwapRequestId, AppError> {
    SwapRequestId::parse(raw).map_err(|_| AppError::BadRequest("invalid request ID format".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: String,
    }

    impl Validate for Probe {
        type Validated = String;

        fn validate(self) -> Result<String, ValidationError> {
            if self.name.trim().is_empty() {
                return Err(ValidationError::Blank { field: "name" });
            }
            Ok(self.name.trim().to_string())
        }
    }

    #[test]
    fn validated_json_runs_rules() {
        let ok = extract_validated_json(Ok(Json(Probe {
            name: "  ada ".into(),
        })))
        .unwrap();
        assert_eq!(ok, "ada");

        let err = extract_validated_json(Ok(Json(Probe { name: " ".into() }))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn request_id_parsing() {
        assert!(parse_request_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        let err = parse_request_id("64b7f0c2a1e4d3f5b6c7d8e9").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
