//! Ошибки хранилища, сервисного слоя и их отображение в HTTP-ответы.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;
use validator::ValidationErrors;

/// Failures of a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Event not found")]
    EventNotFound(i64),

    #[error("Registration not found")]
    RegistrationNotFound(i64),

    #[error("This email is already registered for this event")]
    DuplicateEmail,

    #[error("This phone number is already registered for this event")]
    DuplicatePhone,

    #[error("Registration is closed for this event")]
    RegistrationClosed(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(describe_validation(&errors))
    }
}

// "email is invalid; name is required" - стабильный порядок по имени поля
fn describe_validation(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();

    if messages.is_empty() {
        "Invalid request".to_string()
    } else {
        messages.join("; ")
    }
}

/// Error returned by HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(_)
            | ServiceError::DuplicateEmail
            | ServiceError::DuplicatePhone
            | ServiceError::RegistrationClosed(_) => ApiError::bad_request(err.to_string()),
            ServiceError::EventNotFound(_) | ServiceError::RegistrationNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            ServiceError::Store(e) => {
                // Причину пишем в лог, клиенту - общий текст
                tracing::error!("storage failure: {:?}", e);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err).into()
    }
}

// Ошибки разбора тела, пути и query-строки - всегда 400 с JSON-телом
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(email(message = "email is invalid"))]
        email: String,
    }

    #[test]
    fn validation_message_lists_fields_in_order() {
        let form = Form { name: String::new(), email: "x".into() };
        let err: ServiceError = form.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "email is invalid; name is required");
    }

    #[test]
    fn maps_status_codes() {
        assert_eq!(ApiError::from(ServiceError::DuplicateEmail).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(ServiceError::RegistrationClosed(1)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(ServiceError::EventNotFound(1)).status(), StatusCode::NOT_FOUND);

        let timeout = ApiError::from(StoreError::Timeout(Duration::from_secs(10)));
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.message(), "Internal server error");
    }

    #[test]
    fn duplicate_messages_name_the_field() {
        assert!(ApiError::from(ServiceError::DuplicateEmail).message().contains("email"));
        assert!(ApiError::from(ServiceError::DuplicatePhone).message().contains("phone"));
    }
}
