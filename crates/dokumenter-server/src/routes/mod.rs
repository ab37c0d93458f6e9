//! HTTP routes.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod documents;
pub mod health;
pub mod pdf;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/dokumenter/{personident}", get(documents::list_documents))
        .route("/dokumenter/{personident}/pdf", get(pdf::list_pdfs))
        .route(
            "/pdf/{journalpost_id}/{dokument_info_id}/{variantformat}",
            get(pdf::get_pdf),
        );

    Router::new()
        .nest("/api", api)
        .route("/actuator/live", get(health::live))
        .route("/actuator/ready", get(health::ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
