//! Exact-path asset routing: `/` maps to `/index.html`, everything else is
//! looked up verbatim in the embedded archive.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{archive::AssetIndex, content_type};

pub fn build_router(index: Arc<AssetIndex>) -> Router {
    Router::new()
        .fallback(get(serve_asset))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(index)
}

async fn serve_asset(State(index): State<Arc<AssetIndex>>, uri: Uri) -> Response {
    let path = uri.path();
    let lookup = if path == "/" { "index.html" } else { path.trim_start_matches('/') };

    match index.get(lookup) {
        Some(bytes) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type::for_path(lookup))], bytes.to_vec()).into_response()
        },
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
