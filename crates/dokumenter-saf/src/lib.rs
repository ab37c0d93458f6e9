//! Client for the SAF document archive.
//!
//! This crate implements the downstream half of the dokumenter gateway:
//!
//! - On-behalf-of token exchange against the identity provider
//! - The `dokumentoversiktBruker` GraphQL query
//! - Binary fetch of a single document variant
//! - Best-effort aggregation of every PDF listed for a citizen
//!
//! # Quick Start
//!
//! ```no_run
//! use dokumenter_saf::{BearerToken, SafClient};
//!
//! # async fn example() -> Result<(), dokumenter_saf::SafError> {
//! let client = SafClient::from_env()?;
//! let inbound = BearerToken::new("eyJ...");
//!
//! let response = client.list_documents("12345678910", &inbound, None).await?;
//! if let Ok(overview) = response.into_overview() {
//!     println!("{} journal entries", overview.journal_entries.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SAF_HOST` | SAF base URL |
//! | `SAF_SCOPE` | Scope requested in the on-behalf-of exchange |
//! | `AZURE_APP_CLIENT_ID` | Client id of this gateway |
//! | `AZURE_APP_CLIENT_SECRET` | Client secret of this gateway |
//! | `AZURE_OPENID_CONFIG_TOKEN_ENDPOINT` | Token endpoint of the identity provider |
//! | `DOKUMENTER_SAF_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `DOKUMENTER_SAF_MAX_RETRIES` | Max retries for transient failures (default: 3) |
//! | `DOKUMENTER_PDF_CONCURRENCY` | Concurrent PDF fetches per request (default: 4) |
//! | `DOKUMENTER_OBO_CACHE` | Cache delegated credentials per inbound token (default: on) |

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod source;
pub mod types;

pub use aggregate::{fetch_all_pdfs, AggregationPolicy, PdfBatch};
pub use auth::{BearerToken, DelegatedCredential, OboTokenProvider};
pub use client::{SafClient, SAF_USER_AGENT};
pub use config::{AzureConfig, SafConfig};
pub use error::{SafError, SafResult};
pub use source::DocumentSource;
pub use types::{
    DocumentInfo, DocumentOverview, DocumentOverviewData, DocumentVariant, DownstreamStatus,
    GraphQlError, GraphQlResponse, JournalEntry, PageInfo, PdfBlob, VariantOutcome, VariantRef,
    Variantformat,
};
