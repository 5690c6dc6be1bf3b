use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub struct DiaryError(miette::Error);

impl IntoResponse for DiaryError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal Server Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for DiaryError
where
    E: Into<miette::Error>,
{
    fn from(value: E) -> Self {
        Self(value.into())
    }
}
