//! Static asset serving rooted at the configured base directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tower_http::services::ServeDir;

/// Bytes left alone in listing links; `/` keeps directory entries relative.
const HREF: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Files under `root`; directories without an `index.html` get a listing.
pub fn serve_dir(root: &Path) -> ServeDir<MethodRouter> {
    let listing = get(list_directory).with_state(Arc::new(root.to_path_buf()));
    ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(listing)
}

async fn list_directory(State(root): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let Ok(request_path) = percent_decode_str(uri.path()).decode_utf8() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(dir) = resolve(&root, &request_path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !request_path.ends_with('/') || !dir.is_dir() {
        return StatusCode::NOT_FOUND.into_response();
    }

    match read_listing(&dir).await {
        Ok(names) => Html(render_listing(&request_path, &names)).into_response(),
        Err(e) => {
            log::warn!("⚠️ Could not list {}: {}", dir.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Map a request path onto `root`, refusing anything that climbs out of it.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

async fn read_listing(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by_key(|n| n.to_lowercase());
    Ok(names)
}

fn render_listing(request_path: &str, names: &[String]) -> String {
    let title = format!("Directory listing for {}", escape_html(request_path));
    let items: String = names
        .iter()
        .map(|name| {
            let href = utf8_percent_encode(name, HREF);
            format!("<li><a href=\"{href}\">{}</a></li>\n", escape_html(name))
        })
        .collect();
    format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n{items}</ul>\n<hr>\n</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
