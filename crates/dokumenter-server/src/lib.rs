//! Authenticated gateway in front of the SAF document archive.
//!
//! Callers present a bearer token issued for this gateway. The token is
//! validated against the identity provider's key set, exchanged on behalf of
//! the caller for a SAF-scoped credential, and never forwarded itself.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /api/dokumenter/{personident}` | Document overview |
//! | `GET /api/dokumenter/{personident}/pdf` | Every listed variant, base64 |
//! | `GET /api/pdf/{journalpostId}/{dokumentInfoId}/{variantformat}` | One variant |
//! | `GET /actuator/live`, `GET /actuator/ready` | Probes |

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use routes::router;
pub use state::AppState;
