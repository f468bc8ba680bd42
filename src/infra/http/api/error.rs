use std::error::Error as StdError;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

/// Error response carrying a client-facing `detail` and the diagnostic chain
/// that the response logger reports.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    diagnostics: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            status,
            diagnostics: vec![detail.clone()],
            detail,
        }
    }

    /// Client sees `detail`; the log gets the full `source()` chain of `err`.
    pub fn with_source(status: StatusCode, detail: impl Into<String>, err: &dyn StdError) -> Self {
        let report = ErrorReport::from_error(SOURCE, status, err);
        Self {
            status,
            detail: detail.into(),
            diagnostics: report.messages,
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            detail: self.detail,
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport {
            source: SOURCE,
            status: self.status,
            messages: self.diagnostics,
        }
        .attach(&mut response);
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the `{"detail": ...}` error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` counterpart of [`ApiJson`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;

    #[test]
    fn response_carries_detail_body_and_report() {
        let err = RepoError::Integrity {
            message: "menus_dishes_count_check".into(),
        };
        let response = ApiError::with_source(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
            &err,
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(
            report.messages,
            vec!["integrity error: menus_dishes_count_check".to_string()]
        );
    }
}
