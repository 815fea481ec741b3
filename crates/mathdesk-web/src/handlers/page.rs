//! Browser UI page and the JSON 404 fallback.

use axum::http::Uri;
use axum::response::Html;

use mathdesk_common::ApiError;

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../templates/index.html"))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
