//! The seam between the gateway handlers and SAF.

use async_trait::async_trait;

use crate::auth::BearerToken;
use crate::error::SafResult;
use crate::types::{DocumentOverviewData, GraphQlResponse, VariantOutcome, VariantRef};

/// Lists a citizen's documents and fetches variant bytes on behalf of a caller.
///
/// Implemented by [`crate::SafClient`]; tests substitute stubs.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Run the overview query. `data` and `errors` are both returned as reported.
    async fn list_documents(
        &self,
        personident: &str,
        inbound: &BearerToken,
        limit: Option<u32>,
    ) -> SafResult<GraphQlResponse<DocumentOverviewData>>;

    /// Fetch the bytes of exactly one variant.
    async fn fetch_variant(
        &self,
        variant: &VariantRef,
        inbound: &BearerToken,
    ) -> SafResult<VariantOutcome>;
}
