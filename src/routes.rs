use std::convert::Infallible;
use std::sync::Arc;

use warp::Filter;

use crate::handlers::{handle_rejection, proxy_request};
use crate::models::AppState;

/// The complete gateway: health check, then the proxy for every other path.
pub fn gateway(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let health_check = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| "OK");

    let proxy = warp::any()
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(warp::path::full())
        .and(
            warp::query::raw()
                .or_else(|_| async { Ok::<(String,), Infallible>((String::new(),)) }),
        )
        .and(warp::body::bytes())
        .and(state_filter)
        .and_then(proxy_request);

    health_check.or(proxy).recover(handle_rejection)
}
