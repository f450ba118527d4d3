//! Validating extractors
//!
//! `ValidatedJson` and `ValidatedQuery` deserialize like `Json`/`Query` and
//! then run the `validator` rules declared on the target type. Failures
//! become 400 responses; field-level details are only sent outside
//! production.

use std::collections::BTreeMap;

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::api::middleware::{ApiError, AppState};

/// JSON body that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Query string that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

/// Path parameters whose parse errors use the API error shape
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T> FromRequest<AppState> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| validation_failed(&errors, state))?;
        Ok(Self(value))
    }
}

impl<T> FromRequestParts<AppState> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| validation_failed(&errors, state))?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn validation_failed(errors: &ValidationErrors, state: &AppState) -> ApiError {
    let error = ApiError::bad_request("Validation failed");
    if state.environment.is_production() {
        return error;
    }
    error.with_details(validation_details(errors))
}

/// Flatten validation errors into `{ field: [message, ...] }`
pub fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let details: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();

    serde_json::json!(details)
}
