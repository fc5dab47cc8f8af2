use axum::{
    Form,
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::Method,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::error::ParamError;

pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Parameters as they arrived, before any validation.
///
/// POST requests are read from the form body, everything else from the query
/// string. A body that is not a readable form counts as carrying no fields.
/// When a parameter is repeated the first occurrence wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawParams {
    pub q: Option<String>,
    pub max_results: Option<String>,
}

impl RawParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> RawParams {
        let mut params = RawParams::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "q" => &mut params.q,
                "max_results" => &mut params.max_results,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// The query term, when the request carries a usable one.
    pub fn query_term(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.trim().is_empty())
    }
}

type Pairs = Vec<(String, String)>;

#[async_trait]
impl<S> FromRequest<S> for RawParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = if req.method() == Method::POST {
            match Form::<Pairs>::from_request(req, state).await {
                Ok(Form(pairs)) => pairs,
                Err(rejection) => {
                    tracing::debug!("unreadable form body: {rejection}");
                    Vec::new()
                }
            }
        } else {
            let (mut parts, _body) = req.into_parts();
            match Query::<Pairs>::from_request_parts(&mut parts, state).await {
                Ok(Query(pairs)) => pairs,
                Err(rejection) => {
                    tracing::debug!("unreadable query string: {rejection}");
                    Vec::new()
                }
            }
        };
        Ok(RawParams::from_pairs(pairs))
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

/// Validate `q` and coerce `max_results`.
pub fn normalize(raw: RawParams) -> Result<SearchRequest, ParamError> {
    if raw.query_term().is_none() {
        return Err(ParamError::Missing("q"));
    }
    let query = raw.q.unwrap_or_default();

    let max_results = match raw.max_results {
        None => DEFAULT_MAX_RESULTS,
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|_| ParamError::Invalid {
                name: "max_results",
                value,
            })?,
    };

    Ok(SearchRequest { query, max_results })
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
