//! Static web page

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET / - Serve the inquiry web page
pub async fn get() -> Html<&'static str> {
    Html(INDEX_HTML)
}
