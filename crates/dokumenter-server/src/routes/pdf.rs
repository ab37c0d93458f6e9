//! PDF endpoints.
//!
//! - `GET /api/dokumenter/{personident}/pdf`: every variant listed for the
//!   citizen, base64 encoded, in listing order. `x-skipped-variants` counts
//!   the ones left out; `?strict=true` fails the request on the first one.
//! - `GET /api/pdf/{journalpostId}/{dokumentInfoId}/{variantformat}`: one variant.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderName;
use axum::response::IntoResponse;
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dokumenter_saf::types::serialize_base64;
use dokumenter_saf::{fetch_all_pdfs, AggregationPolicy, VariantOutcome, VariantRef, Variantformat};
use serde::{Deserialize, Serialize};

use super::documents::require_identifier;
use crate::auth::Authenticated;
use crate::error::{GatewayError, Result};
use crate::state::AppState;

pub const SKIPPED_VARIANTS_HEADER: HeaderName = HeaderName::from_static("x-skipped-variants");

#[derive(Debug, Default, Deserialize)]
pub struct PdfListParams {
    #[serde(default)]
    pub strict: bool,
}

/// One fetched variant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dokument {
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
    pub journalpost_id: String,
    pub dokument_info_id: String,
    pub variantformat: Variantformat,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

pub async fn list_pdfs(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(personident): Path<String>,
    params: std::result::Result<Query<PdfListParams>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params.map_err(|e| GatewayError::invalid_request(e.body_text()))?;
    let personident = require_identifier("personident", &personident)?;

    let response = state
        .documents
        .list_documents(personident, &identity.token, None)
        .await?;

    let overview = response
        .into_overview()
        .map_err(GatewayError::from_graphql_errors)?;

    let policy = if params.strict {
        AggregationPolicy::AllOrNothing
    } else {
        AggregationPolicy::BestEffort
    };

    let batch = fetch_all_pdfs(
        state.documents.as_ref(),
        &overview,
        &identity.token,
        state.pdf_concurrency,
        policy,
    )
    .await?;

    if batch.skipped > 0 {
        tracing::warn!(
            skipped = batch.skipped,
            fetched = batch.blobs.len(),
            "some document variants were skipped"
        );
    }

    let encoded: Vec<String> = batch
        .blobs
        .iter()
        .map(|blob| STANDARD.encode(&blob.data))
        .collect();

    Ok((
        [(SKIPPED_VARIANTS_HEADER, batch.skipped.to_string())],
        Json(encoded),
    ))
}

pub async fn get_pdf(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path((journalpost_id, dokument_info_id, variantformat)): Path<(String, String, String)>,
) -> Result<Json<Dokument>> {
    let journalpost_id = require_identifier("journalpostId", &journalpost_id)?;
    let dokument_info_id = require_identifier("dokumentInfoId", &dokument_info_id)?;
    let variantformat = Variantformat::parse(&variantformat).ok_or_else(|| {
        GatewayError::invalid_request(format!("unknown variantformat '{}'", variantformat))
    })?;

    let variant = VariantRef::new(journalpost_id, dokument_info_id, variantformat);

    match state.documents.fetch_variant(&variant, &identity.token).await? {
        VariantOutcome::Fetched(blob) => Ok(Json(Dokument {
            data: blob.data,
            journalpost_id: variant.journalpost_id,
            dokument_info_id: variant.dokument_info_id,
            variantformat: variant.variantformat,
            content_type: blob.content_type,
            content_disposition: blob.content_disposition,
        })),
        VariantOutcome::Rejected(status) => Err(GatewayError::Downstream(status)),
    }
}
