//! Input validation helpers
//!
//! Glue between `validator` derive checks on request DTOs and the
//! unified error format.

use crate::utils::AppError;
use validator::Validate;

/// Run `validator` derive checks on a DTO and fold failures into one
/// field-detailed [`AppError`].
pub fn validate_dto<T: Validate>(dto: &T) -> Result<(), AppError> {
    let errors = match dto.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    let mut err = AppError::validation("Request validation failed");
    for (field, field_errors) in errors.field_errors() {
        let reasons: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        err = err.with_detail(field.to_string(), reasons.join(", "));
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 10))]
        name: String,
    }

    #[test]
    fn test_validate_dto_passes() {
        let dto = Sample {
            name: "ok".to_string(),
        };
        assert!(validate_dto(&dto).is_ok());
    }

    #[test]
    fn test_validate_dto_collects_field_errors() {
        let dto = Sample {
            name: String::new(),
        };
        let err = validate_dto(&dto).unwrap_err();
        assert_eq!(err.code, crate::utils::ErrorCode::ValidationFailed);
        assert!(err.details.unwrap().contains_key("name"));
    }
}
