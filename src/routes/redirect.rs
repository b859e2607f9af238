//! Plain-HTTP listener that sends every request to the HTTPS port.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

const HTTPS_DEFAULT_PORT: u16 = 443;

#[derive(Debug, Clone, Copy)]
pub struct RedirectTarget {
    pub https_port: u16,
}

pub fn redirect_router(https_port: u16) -> Router {
    Router::new()
        .fallback(redirect_to_https)
        .with_state(RedirectTarget { https_port })
}

async fn redirect_to_https(
    State(target): State<RedirectTarget>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.host());
    let Some(host) = host else {
        return (StatusCode::BAD_REQUEST, "Missing host").into_response();
    };

    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let location = https_location(host, target.https_port, path);
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Rewrites `host[:port]` to point at the HTTPS port, keeping the path and
/// query untouched.
pub fn https_location(host: &str, https_port: u16, path_and_query: &str) -> String {
    let hostname = strip_port(host);
    if https_port == HTTPS_DEFAULT_PORT {
        format!("https://{hostname}{path_and_query}")
    } else {
        format!("https://{hostname}:{https_port}{path_and_query}")
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_once(']').map_or(host, |(v6, _)| &host[..=v6.len()]);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
