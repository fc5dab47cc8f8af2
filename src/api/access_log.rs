//! One access log line per request, written after the response is built.

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use nanoid::nanoid;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;
use tracing::Instrument;

/// Query term a handler managed to extract. Handlers attach it to their
/// response so the access log can report it even for failed searches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTerm(pub String);

const UNKNOWN: &str = "-";

/// Client address, trusting forwarding proxies.
///
/// Priority:
/// 1. X-Forwarded-For header (first entry)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
pub fn client_addr(request: &Request) -> Option<IpAddr> {
    let headers = request.headers();
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        return forwarded
            .to_str()
            .ok()
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        return real_ip
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

pub async fn log_access(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let ip = client_addr(&request)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let span = tracing::info_span!(
        "request",
        id = %nanoid!(10),
        method = %request.method(),
        path = %request.uri().path(),
    );

    let response = next.run(request).instrument(span.clone()).await;

    let elapsed = start.elapsed().as_secs_f64();
    let query = response
        .extensions()
        .get::<QueryTerm>()
        .map(|q| q.0.as_str())
        .unwrap_or(UNKNOWN);
    span.in_scope(|| {
        tracing::info!(
            target: "access",
            status = response.status().as_u16(),
            "IP:{ip}, time cost:{elapsed:.2} s, query:{query}"
        );
    });
    response
}
