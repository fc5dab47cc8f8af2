use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::backend::SearchBackend;
use crate::data_models::SearchMode;
use crate::query_engine::QueryEngine;

use super::ApiError;
use super::access_log::QueryTerm;
use super::models::{RawParams, normalize};

async fn run_search<B: SearchBackend>(
    query_engine: &QueryEngine<B>,
    mode: SearchMode,
    params: RawParams,
) -> Response {
    let term = params.query_term().map(str::to_string);

    let mut response = match normalize(params) {
        Ok(request) => match query_engine
            .execute(mode, &request.query, request.max_results)
            .await
        {
            Ok(results) => Json(results).into_response(),
            Err(e) => ApiError::from(e).into_response(),
        },
        Err(e) => ApiError::from(e).into_response(),
    };
    if let Some(term) = term {
        response.extensions_mut().insert(QueryTerm(term));
    }
    response
}

pub async fn search<B: SearchBackend>(
    State(query_engine): State<Arc<QueryEngine<B>>>,
    params: RawParams,
) -> Response {
    run_search(&query_engine, SearchMode::Text, params).await
}

pub async fn search_answers<B: SearchBackend>(
    State(query_engine): State<Arc<QueryEngine<B>>>,
    params: RawParams,
) -> Response {
    run_search(&query_engine, SearchMode::Answers, params).await
}

pub async fn search_images<B: SearchBackend>(
    State(query_engine): State<Arc<QueryEngine<B>>>,
    params: RawParams,
) -> Response {
    run_search(&query_engine, SearchMode::Images, params).await
}

pub async fn search_videos<B: SearchBackend>(
    State(query_engine): State<Arc<QueryEngine<B>>>,
    params: RawParams,
) -> Response {
    run_search(&query_engine, SearchMode::Videos, params).await
}
