pub mod ask;
pub mod health;
pub mod index;
pub mod metrics;

use axum::{
    Router,
    routing::{get, post},
};

use crate::agent::InquiryAgent;

/// Build the inquiry routes
pub fn inquiry_routes() -> Router<InquiryAgent> {
    Router::new()
        .route("/", get(index::get))
        .route("/ask", post(ask::ask))
}
