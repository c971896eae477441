// HTTP error mapping
use crate::application::error::{DialogError, SessionError, StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dialog(#[from] DialogError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(e) => session_status(e),
            ApiError::Store(e) => match e {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::EmptyName | StoreError::UnknownTemplate(_) => StatusCode::BAD_REQUEST,
                StoreError::LastDashboard | StoreError::Editing(_) => StatusCode::CONFLICT,
                StoreError::Persistence(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Dialog(e) => match e {
                DialogError::Closed | DialogError::NoValidDraft | DialogError::NotConfigurable(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DialogError::Session(e) => session_status(e),
            },
        }
    }
}

fn session_status(error: &SessionError) -> StatusCode {
    match error {
        SessionError::NotEditing(_) | SessionError::AlreadyEditing(_) | SessionError::SaveInFlight(_) => {
            StatusCode::CONFLICT
        }
        SessionError::UnknownDashboard(_) => StatusCode::NOT_FOUND,
        SessionError::Persistence(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
