use axum::{response::{IntoResponse, Response}, Json};
use golf_admin_entities::{DomainError, FieldErrors};
use hyper::StatusCode;
use sea_orm::DbErr;
use serde::{Serialize, Deserialize};
use tracing::error;
use validator::{Validate, ValidationErrors};


#[derive(Debug, Clone)]
pub struct APIError {
    pub message: String,
    pub code: StatusCode,
    pub errors: Option<FieldErrors>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct APIErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// Body of endpoints that perform an action instead of returning a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Json<ActionResponse> {
        Json(ActionResponse { success: true, message: message.into() })
    }
}

impl APIError {
    pub fn new(message: String) -> Self {
        APIError {
            message,
            code: StatusCode::INTERNAL_SERVER_ERROR,
            errors: None,
        }
    }

    pub fn not_found(what: &str) -> Self {
        APIError { message: format!("{} not found", what), code: StatusCode::NOT_FOUND, errors: None }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        APIError { message: message.into(), code: StatusCode::CONFLICT, errors: None }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        errors.into()
    }
}

impl From<anyhow::Error> for APIError {
    fn from(err: anyhow::Error) -> Self {
        error!("Error while handling request {}", err.to_string());
        APIError::new(err.to_string())
    }
}

impl From<DbErr> for APIError {
    fn from(err: DbErr) -> Self {
        handle_error(err)
    }
}

impl From<DomainError> for APIError {
    fn from(err: DomainError) -> Self {
        error!("Error while handling request {}", err);
        let code = match &err {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        APIError { message: err.to_string(), code, errors: None }
    }
}

impl From<FieldErrors> for APIError {
    fn from(errors: FieldErrors) -> Self {
        error!("Validation failed for fields {:?}", errors.0.keys().collect::<Vec<_>>());
        APIError {
            message: "The given data was invalid".into(),
            code: StatusCode::UNPROCESSABLE_ENTITY,
            errors: Some(errors),
        }
    }
}

impl From<ValidationErrors> for APIError {
    fn from(errors: ValidationErrors) -> Self {
        field_errors(&errors).into()
    }
}

impl IntoResponse for APIError
{
    fn into_response(self) -> Response {
        let body = APIErrorResponse {
            success: false,
            message: self.message,
            errors: self.errors,
        };
        (self.code, Json(body)).into_response()
    }
}


impl From<(StatusCode, &str)> for APIError {
    fn from((code, message): (StatusCode, &str)) -> Self {
        error!("Error while handling request {}", message);
        APIError { message: message.to_string(), code, errors: None }
    }
}

impl From<(StatusCode, String)> for APIError {
    fn from((code, message): (StatusCode, String)) -> Self {
        error!("Error while handling request {}", message);
        APIError { message, code, errors: None }
    }
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for e in field_errors {
            let message = e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("Invalid value ({})", e.code));
            out.add(&field.to_string(), message);
        }
    }
    out
}

/// Runs the derived validation rules and returns the failures as field errors.
pub fn validate_request<T: Validate>(request: &T) -> FieldErrors {
    match request.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => field_errors(&errors),
    }
}

pub fn handle_error<E>(err: E) -> APIError
where
    E: std::error::Error
{
    error!("Error while handling request {}", err);
    APIError::new(err.to_string())
}

