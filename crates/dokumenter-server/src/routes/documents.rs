//! `GET /api/dokumenter/{personident}`

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use dokumenter_saf::DocumentOverview;
use serde::Deserialize;

use crate::auth::Authenticated;
use crate::error::{GatewayError, Result};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OverviewParams {
    /// Upper bound on journal entries returned.
    pub antall: Option<u32>,
}

pub async fn list_documents(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(personident): Path<String>,
    params: std::result::Result<Query<OverviewParams>, QueryRejection>,
) -> Result<Json<DocumentOverview>> {
    let Query(params) = params.map_err(|e| GatewayError::invalid_request(e.body_text()))?;
    let personident = require_identifier("personident", &personident)?;

    let response = state
        .documents
        .list_documents(personident, &identity.token, params.antall)
        .await?;

    let errors = response.errors().len();
    let overview = response
        .into_overview()
        .map_err(GatewayError::from_graphql_errors)?;

    if errors > 0 {
        tracing::warn!(errors, "document overview is partial");
    }

    Ok(Json(overview))
}

/// Presence check only; identifiers are otherwise opaque.
pub(crate) fn require_identifier<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(GatewayError::invalid_request(format!("{} is required", name)));
    }
    Ok(value)
}
