use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    pesan_dispatch::DispatchError,
};

/// Why a `/send-message` request failed.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Phone number and message are required")]
    MissingFields,
    #[error("Phone number {0} is not allowed")]
    NotAllowed(String),
    #[error("Failed to send message: {0}")]
    Delivery(#[from] DispatchError),
}

impl SendError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields => StatusCode::BAD_REQUEST,
            Self::NotAllowed(_) => StatusCode::FORBIDDEN,
            Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
