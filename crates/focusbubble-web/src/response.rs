//! Response envelope, error mapping and JSON body extraction

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response as AxumResponse},
};
use focusbubble_core::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// HTTP status for an engine error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wrap an engine result in the envelope with the matching status
pub(crate) fn respond<T: Serialize>(result: Result<T>) -> AxumResponse {
    match result {
        Ok(data) => Json(ApiResponse::ok(data)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Request failed: {}", e);
            }
            (status, Json(ApiResponse::<()>::err(e.to_string()))).into_response()
        }
    }
}

/// JSON body extractor whose rejections use the envelope and a 400 status
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AxumResponse;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(reject(rejection)),
        }
    }
}

fn reject(rejection: JsonRejection) -> AxumResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::err(rejection.body_text())),
    )
        .into_response()
}
