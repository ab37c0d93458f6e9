//! Fetch every PDF listed in a document overview.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::auth::BearerToken;
use crate::error::{SafError, SafResult};
use crate::source::DocumentSource;
use crate::types::{DocumentOverview, PdfBlob, VariantOutcome, VariantRef};

/// What a failed variant does to the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Skip failed variants and count them.
    #[default]
    BestEffort,
    /// First failure fails the whole batch.
    AllOrNothing,
}

/// Successful blobs in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct PdfBatch {
    pub blobs: Vec<PdfBlob>,
    pub skipped: usize,
}

/// Enumerate variants in overview order, de-duplicate, fetch with at most
/// `concurrency` in flight and keep the order.
///
/// Token exchange failures abort under either policy since no later variant
/// could succeed with the same inbound token.
pub async fn fetch_all_pdfs(
    source: &dyn DocumentSource,
    overview: &DocumentOverview,
    inbound: &BearerToken,
    concurrency: usize,
    policy: AggregationPolicy,
) -> SafResult<PdfBatch> {
    let variants = unique_variants(overview.variants());
    debug!(
        variants = variants.len(),
        concurrency,
        ?policy,
        "aggregating document variants"
    );

    let mut results = stream::iter(variants)
        .map(move |variant| async move {
            let result = source.fetch_variant(&variant, inbound).await;
            (variant, result)
        })
        .buffered(concurrency.max(1));

    let mut batch = PdfBatch::default();

    while let Some((variant, result)) = results.next().await {
        let failure = match result {
            Ok(VariantOutcome::Fetched(blob)) => {
                batch.blobs.push(blob);
                continue;
            }
            Ok(VariantOutcome::Rejected(status)) => SafError::Downstream(status),
            Err(e @ SafError::TokenExchange { .. }) => return Err(e),
            Err(e) => e,
        };

        if policy == AggregationPolicy::AllOrNothing {
            return Err(failure);
        }

        warn!(
            journalpost_id = %variant.journalpost_id,
            dokument_info_id = %variant.dokument_info_id,
            variantformat = %variant.variantformat,
            error = %failure,
            "skipping document variant"
        );
        batch.skipped += 1;
    }

    Ok(batch)
}

fn unique_variants(variants: Vec<VariantRef>) -> Vec<VariantRef> {
    let mut seen = HashSet::new();
    variants
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
