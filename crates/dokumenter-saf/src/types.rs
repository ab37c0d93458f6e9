//! Response types for the SAF protocol.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};

/// Renderable formats a document variant may have.
///
/// Closed set: values from callers go through [`Variantformat::parse`] and
/// anything outside it is rejected before SAF is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Variantformat {
    Arkiv,
    Sladdet,
    Produksjon,
    ProduksjonDlf,
    Fullversjon,
    Original,
}

impl Variantformat {
    pub const ALL: [Variantformat; 6] = [
        Self::Arkiv,
        Self::Sladdet,
        Self::Produksjon,
        Self::ProduksjonDlf,
        Self::Fullversjon,
        Self::Original,
    ];

    /// Wire literal (e.g. `"ARKIV"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arkiv => "ARKIV",
            Self::Sladdet => "SLADDET",
            Self::Produksjon => "PRODUKSJON",
            Self::ProduksjonDlf => "PRODUKSJON_DLF",
            Self::Fullversjon => "FULLVERSJON",
            Self::Original => "ORIGINAL",
        }
    }

    /// Parse an exact wire literal. Case-sensitive; no coercion.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }
}

impl fmt::Display for Variantformat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GraphQL envelope. SAF may return data and errors side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,

    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl<T> GraphQlResponse<T> {
    /// Errors reported by SAF, empty when there were none.
    pub fn errors(&self) -> &[GraphQlError] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Data and errors both present.
    pub fn is_partial(&self) -> bool {
        self.data.is_some() && !self.errors().is_empty()
    }
}

/// A single GraphQL error as reported by SAF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlError {
    /// `extensions.code` (e.g. `"not_found"`, `"forbidden"`).
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|code| code.as_str())
    }
}

/// `data` of the `dokumentoversiktBruker` query.
///
/// The overview is nullable: a resolver error nulls it while `data` itself
/// stays present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOverviewData {
    #[serde(rename = "dokumentoversiktBruker", default)]
    pub document_overview: Option<DocumentOverview>,
}

impl GraphQlResponse<DocumentOverviewData> {
    /// The overview, or the errors explaining why there is none. A null
    /// `data` and a null `dokumentoversiktBruker` are the same outcome.
    pub fn into_overview(self) -> Result<DocumentOverview, Vec<GraphQlError>> {
        match self.data.and_then(|data| data.document_overview) {
            Some(overview) => Ok(overview),
            None => Err(self.errors.unwrap_or_default()),
        }
    }
}

/// A citizen's archive entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentOverview {
    #[serde(rename = "journalposter", default)]
    pub journal_entries: Vec<JournalEntry>,

    #[serde(rename = "sideInfo", default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

impl DocumentOverview {
    /// Every variant in enumeration order: journal entry, then document, then variant.
    pub fn variants(&self) -> Vec<VariantRef> {
        self.journal_entries
            .iter()
            .flat_map(|entry| {
                entry.documents.iter().flatten().flat_map(move |doc| {
                    doc.variants.iter().map(move |variant| VariantRef {
                        journalpost_id: entry.journalpost_id.clone(),
                        dokument_info_id: doc.dokument_info_id.clone(),
                        variantformat: variant.variantformat,
                    })
                })
            })
            .collect()
    }
}

/// One journal entry (journalpost).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(rename = "journalpostId")]
    pub journalpost_id: String,

    #[serde(rename = "tittel", default)]
    pub title: Option<String>,

    #[serde(rename = "journalposttype", default)]
    pub kind: Option<String>,

    #[serde(rename = "journalstatus", default)]
    pub status: Option<String>,

    #[serde(default)]
    pub tema: Option<String>,

    #[serde(rename = "datoOpprettet", default)]
    pub created: Option<String>,

    #[serde(rename = "dokumenter", default)]
    pub documents: Option<Vec<DocumentInfo>>,
}

/// A document inside a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(rename = "dokumentInfoId")]
    pub dokument_info_id: String,

    #[serde(rename = "tittel", default)]
    pub title: Option<String>,

    #[serde(default)]
    pub brevkode: Option<String>,

    #[serde(rename = "dokumentvarianter", default)]
    pub variants: Vec<DocumentVariant>,
}

/// One renderable variant of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVariant {
    pub variantformat: Variantformat,

    #[serde(rename = "filnavn", default)]
    pub filename: Option<String>,

    #[serde(rename = "saksbehandlerHarTilgang", default)]
    pub caseworker_has_access: Option<bool>,

    #[serde(default)]
    pub skjerming: Option<String>,
}

/// Paging info (`sideInfo`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub sluttpeker: Option<String>,

    #[serde(default)]
    pub finnes_neste_side: Option<bool>,

    #[serde(default)]
    pub antall: Option<i64>,

    #[serde(default)]
    pub totalt_antall: Option<i64>,
}

/// Address of one variant's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantRef {
    pub journalpost_id: String,
    pub dokument_info_id: String,
    pub variantformat: Variantformat,
}

impl VariantRef {
    pub fn new(
        journalpost_id: impl Into<String>,
        dokument_info_id: impl Into<String>,
        variantformat: Variantformat,
    ) -> Self {
        Self {
            journalpost_id: journalpost_id.into(),
            dokument_info_id: dokument_info_id.into(),
            variantformat,
        }
    }
}

/// Raw bytes of one variant plus the headers SAF sent with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBlob {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

/// Non-success statuses from SAF, as the gateway distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownstreamStatus {
    Unauthorized,
    Forbidden,
    NotFound,
    Unrecognized(u16),
}

impl DownstreamStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Unrecognized(code) => *code,
        }
    }
}

impl fmt::Display for DownstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.code())
    }
}

/// Outcome of a single variant fetch. Only `200` counts as fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    Fetched(PdfBlob),
    Rejected(DownstreamStatus),
}

/// Serialize bytes as a base64 string, the JSON shape callers already consume.
pub fn serialize_base64<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}
