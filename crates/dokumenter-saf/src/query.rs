//! GraphQL request bodies sent to SAF.

use serde::Serialize;

const DOKUMENTOVERSIKT_BRUKER: &str = include_str!("../queries/dokumentoversiktBruker.graphql");

/// Subject-matter categories the gateway lists documents for. Not caller-supplied.
pub const TEMA: [Tema; 3] = [Tema::Aap, Tema::Syk, Tema::Sym];

/// First page cursor.
const FIRST_PAGE: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tema {
    Aap,
    Syk,
    Sym,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrukerIdType {
    Fnr,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrukerId {
    pub id: String,
    #[serde(rename = "type")]
    pub id_type: BrukerIdType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DokumentoversiktVariables {
    pub bruker_id: BrukerId,
    pub tema: Vec<Tema>,
    pub foerste: i32,
    pub etter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<V> {
    pub query: String,
    pub variables: V,
}

/// The query text on a single line.
pub fn dokumentoversikt_bruker_query() -> String {
    DOKUMENTOVERSIKT_BRUKER
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the `dokumentoversiktBruker` request. `limit: None` means unbounded.
pub fn dokumentoversikt_request(
    personident: &str,
    limit: Option<u32>,
) -> GraphQlRequest<DokumentoversiktVariables> {
    let foerste = limit
        .map(|n| i32::try_from(n).unwrap_or(i32::MAX))
        .unwrap_or(i32::MAX);

    GraphQlRequest {
        query: dokumentoversikt_bruker_query(),
        variables: DokumentoversiktVariables {
            bruker_id: BrukerId {
                id: personident.to_string(),
                id_type: BrukerIdType::Fnr,
            },
            tema: TEMA.to_vec(),
            foerste,
            etter: Some(FIRST_PAGE.to_string()),
        },
    }
}
