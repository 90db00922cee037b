use std::any::Any;

use api_types::{ErrorBody, FieldError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;
use validator::{ValidationErrors, ValidationErrorsKind};

pub use server::{ServerState, router, run_with_listener};

mod budgets;
mod cards;
mod categories;
mod extract;
mod savings;
mod server;
mod transactions;
mod users;

const INTERNAL_ERROR: &str = "internal server error";

pub enum ServerError {
    Engine(EngineError),
    Validation(ValidationErrors),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::InvalidCredentials | EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Database(_) | EngineError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidPeriod(_)
        | EngineError::InvalidCursor(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidValue(_)
        | EngineError::CardPayment(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            INTERNAL_ERROR.to_string()
        }
        EngineError::Password(reason) => {
            tracing::error!("password hashing error: {reason}");
            INTERNAL_ERROR.to_string()
        }
        other => other.to_string(),
    }
}

/// Flattens nested validation errors into `field` paths such as
/// `categories[1].allocated_minor`.
fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| FieldError {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                ErrorBody {
                    error: message_for_engine_error(err),
                    errors: Vec::new(),
                },
            ),
            ServerError::Validation(errors) => {
                let mut fields = Vec::new();
                collect_field_errors("", &errors, &mut fields);
                fields.sort_by(|a, b| a.field.cmp(&b.field));
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: "validation failed".to_string(),
                        errors: fields,
                    },
                )
            }
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err,
                    errors: Vec::new(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Turns a handler panic into the same 500 body as any other internal error.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("handler panicked: {detail}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: INTERNAL_ERROR.to_string(),
            errors: Vec::new(),
        }),
    )
        .into_response()
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}
