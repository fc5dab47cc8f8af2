use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::SearchBackend;
use crate::data_models::SearchMode;
use crate::error::{BackendError, ParamError};
use crate::query_engine::QueryEngine;

pub mod access_log;
pub mod handlers;
pub mod models;

use models::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Param(_) => StatusCode::BAD_REQUEST,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Param(ParamError::Missing(_)) => "missing_parameter",
            ApiError::Param(ParamError::Invalid { .. }) => "invalid_parameter",
            ApiError::Backend(_) => "backend_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Param(e) => e.to_string(),
            ApiError::Backend(e) => {
                tracing::error!(error = %e, "search backend failed");
                "the search backend failed to answer".to_string()
            }
        };
        let body = ErrorBody {
            error: self.kind().to_string(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

pub fn create_router<B: SearchBackend>(query_engine: Arc<QueryEngine<B>>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            SearchMode::Text.path(),
            get(handlers::search::<B>).post(handlers::search::<B>),
        )
        .route(
            SearchMode::Answers.path(),
            get(handlers::search_answers::<B>).post(handlers::search_answers::<B>),
        )
        .route(
            SearchMode::Images.path(),
            get(handlers::search_images::<B>).post(handlers::search_images::<B>),
        )
        .route(
            SearchMode::Videos.path(),
            get(handlers::search_videos::<B>).post(handlers::search_videos::<B>),
        )
        .with_state(query_engine)
        .layer(middleware::from_fn(access_log::log_access))
        .layer(cors)
}
