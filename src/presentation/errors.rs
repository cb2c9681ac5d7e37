// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::dto::lead_response::ScrapeLeadsResponseDto;
use crate::domain::repositories::lead_repository::RepositoryError;
use crate::utils::errors::ScrapeError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

/// 采集任务错误对应的 HTTP 状态码
pub fn scrape_error_status(error: &ScrapeError) -> StatusCode {
    match error {
        ScrapeError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        ScrapeError::NavigationTimeout(_) | ScrapeError::JobTimeout(_) => {
            StatusCode::GATEWAY_TIMEOUT
        }
        ScrapeError::Blocked(_) => StatusCode::SERVICE_UNAVAILABLE,
        ScrapeError::Busy => StatusCode::TOO_MANY_REQUESTS,
        ScrapeError::SessionUnavailable(_) | ScrapeError::Browser(_) => StatusCode::BAD_GATEWAY,
        ScrapeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(scrape_error) = self.0.downcast_ref::<ScrapeError>() {
            let body = ScrapeLeadsResponseDto::failure(scrape_error.to_string(), scrape_error.kind());
            return (scrape_error_status(scrape_error), Json(body)).into_response();
        }

        let error_message = self.0.to_string();
        let status = match self.0.downcast_ref::<RepositoryError>() {
            Some(RepositoryError::Database(_db_err)) => StatusCode::INTERNAL_SERVER_ERROR,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
