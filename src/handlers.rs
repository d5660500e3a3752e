use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use hyper::{Body, HeaderMap, Method, Request, Response, StatusCode};
use tokio::time::timeout;
use warp::http::Uri;
use warp::Rejection;

use crate::errors::GatewayError;
use crate::middleware::FilterOutcome;
use crate::models::AppState;
use crate::services::GateRequest;


pub async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else if let Some(e) = err.find::<GatewayError>() {
        match e {
            GatewayError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            GatewayError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
            }
            GatewayError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "Gateway timeout"),
            GatewayError::Http(_) => (StatusCode::BAD_GATEWAY, "Bad gateway"),
            GatewayError::InvalidUri(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(warp::reply::with_status(message.to_string(), code))
}

fn empty_response(status: StatusCode) -> Result<Response<Body>, Rejection> {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .map_err(|e| warp::reject::custom(GatewayError::Http(e.to_string())))
}

/// Routes, gates and forwards one request.
pub async fn proxy_request(
    method: Method,
    headers: HeaderMap,
    full_path: warp::path::FullPath,
    query: String,
    body: Bytes,
    state: Arc<AppState>,
) -> Result<Response<Body>, Rejection> {
    let start_time = Instant::now();
    let path = full_path.as_str();

    let route = state.find_route(path).ok_or_else(|| {
        tracing::debug!(%path, "No route matched");
        warp::reject::custom(GatewayError::RouteNotFound(path.to_string()))
    })?;

    let gate_request = GateRequest::new(path, &headers);
    if let FilterOutcome::Respond(status) = route.filters.run(&gate_request) {
        tracing::info!(
            "{} {} {} {}ms",
            method,
            path,
            status,
            start_time.elapsed().as_millis()
        );
        return empty_response(status);
    }

    let base = state.upstream_base(route).map_err(|e| {
        tracing::warn!(route = %route.definition.id, error = %e, "Upstream unavailable");
        warp::reject::custom(e)
    })?;

    let mut uri_str = format!("{}{}", base, path);
    if !query.is_empty() {
        uri_str.push('?');
        uri_str.push_str(&query);
    }

    let uri: Uri = uri_str.parse().map_err(|e: hyper::http::uri::InvalidUri| {
        tracing::error!(uri = %uri_str, error = %e, "Failed to parse upstream URI");
        warp::reject::custom(GatewayError::InvalidUri(e.to_string()))
    })?;

    let mut req_builder = Request::builder().method(method.clone()).uri(uri);
    for (name, value) in headers.iter() {
        if *name != hyper::header::HOST {
            req_builder = req_builder.header(name, value);
        }
    }

    let req = req_builder.body(Body::from(body)).map_err(|e| {
        tracing::error!(error = %e, "Error building upstream request");
        warp::reject::custom(GatewayError::Http(e.to_string()))
    })?;

    let response = match timeout(state.request_timeout, state.client.request(req)).await {
        Ok(result) => result.map_err(|e| {
            tracing::warn!(route = %route.definition.id, error = %e, "Error forwarding request");
            warp::reject::custom(GatewayError::Http(e.to_string()))
        })?,
        Err(_) => {
            tracing::warn!(route = %route.definition.id, "Upstream timed out");
            return Err(warp::reject::custom(GatewayError::Timeout));
        }
    };

    tracing::info!(
        "{} {} {} {}ms",
        method,
        path,
        response.status(),
        start_time.elapsed().as_millis()
    );

    Ok(response)
}
