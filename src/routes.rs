use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get_service, post};
use axum::Router;
use log::info;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;
use crate::records::{self, RecordStore};
use crate::static_files;
use crate::types::{Collection, COLLECTIONS};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

pub fn create_routes(config: &Config) -> Router {
    let store = Arc::new(RecordStore::from_config(config));
    router(store, &config.base_dir)
}

/// Save endpoints from [`COLLECTIONS`], static files for everything else.
pub fn router(store: Arc<RecordStore>, base_dir: &Path) -> Router {
    let files = static_files::serve_dir(base_dir);

    let mut app = Router::new();
    for collection in COLLECTIONS.iter() {
        let store = store.clone();
        let save = move |headers: HeaderMap, body: Result<Bytes, BytesRejection>| {
            records::save_collection(store, collection, headers, body)
        };
        app = app.route(
            collection.path,
            post(save)
                .get_service(files.clone())
                .options(preflight),
        );
    }

    let cors = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ));

    app.fallback(
        get_service(files)
            .post(unmapped_post)
            .options(preflight),
    )
    .layer(DefaultBodyLimit::disable())
    .layer(cors)
    .layer(middleware::from_fn(log_request))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn unmapped_post() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    info!(
        "{} \"{} {}\" {}",
        request_emoji(&method, &path),
        method,
        path,
        response.status().as_u16()
    );
    response
}

fn request_emoji(method: &Method, path: &str) -> &'static str {
    if method == Method::POST {
        if let Some(collection) = Collection::by_path(path) {
            return collection.emoji;
        }
    }
    let is_asset = [".js", ".json", ".png", ".jpg"]
        .iter()
        .any(|ext| path.ends_with(ext));
    if method == Method::GET && is_asset {
        "📁"
    } else {
        "🌐"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_follows_endpoint_and_asset_type() {
        assert_eq!(request_emoji(&Method::POST, "/save-records"), "💾");
        assert_eq!(request_emoji(&Method::POST, "/save-punch-in"), "🎯");
        assert_eq!(request_emoji(&Method::POST, "/save-punch-out"), "🔴");
        assert_eq!(request_emoji(&Method::POST, "/save-currently-online"), "👥");
        assert_eq!(request_emoji(&Method::GET, "/face-api.min.js"), "📁");
        assert_eq!(request_emoji(&Method::GET, "/Faces/alice.jpg"), "📁");
        assert_eq!(request_emoji(&Method::GET, "/index.html"), "🌐");
        assert_eq!(request_emoji(&Method::POST, "/elsewhere"), "🌐");
    }
}
