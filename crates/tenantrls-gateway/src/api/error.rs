use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tenantrls_core::error::{ClientCode, TenantRlsError};

use super::envelope::Envelope;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// HTTP rendering of [`TenantRlsError`].
#[derive(Debug)]
pub struct ApiError(pub TenantRlsError);

impl From<TenantRlsError> for ApiError {
    fn from(e: TenantRlsError) -> Self {
        ApiError(e)
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest | ClientCode::ValidationFailed | ClientCode::UnsupportedVersion => {
            StatusCode::BAD_REQUEST
        }
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = status_for(code);

        let body = match &self.0 {
            TenantRlsError::Validation { fields } => Envelope::failure(
                "missing required fields",
                Some(self.0.to_string()),
                Some(json!({ "code": code.as_str(), "fields": fields })),
            ),
            TenantRlsError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                Envelope::failure(
                    "internal server error",
                    None,
                    Some(json!({ "code": code.as_str() })),
                )
            }
            other => Envelope::failure(
                other.to_string(),
                None,
                Some(json!({ "code": code.as_str() })),
            ),
        };

        (status, Json(body)).into_response()
    }
}
