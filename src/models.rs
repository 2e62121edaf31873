//! Core data models used throughout lease-assist.
//!
//! These types represent the contract metadata, routed context payloads,
//! and answers that flow through the question-answering pipeline.

use serde::{Deserialize, Serialize};

/// Flat projection of a contract record's key fields.
///
/// Every field degrades to an empty string when the source path is
/// absent; a blank field means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataSummary {
    pub store_name: String,
    pub cnpj: String,
    pub contract_number: String,
    pub store_area: String,
    pub contract_start: String,
    pub contract_end: String,
    pub floor: String,
    pub store_number: String,
}

/// A document returned from the corpus index, with its metadata for
/// provenance display.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    pub id: String,
    pub text: String,
    pub metadata: MetadataSummary,
    pub score: f64,
}

/// Pre-aggregated context built directly from the metadata collection,
/// bypassing retrieval. Serializes to the exact JSON shape the
/// synthesizer prompt expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StructuredSummary {
    #[serde(rename = "contracts")]
    Expirations(Vec<ExpirationEntry>),
    #[serde(rename = "stores")]
    Areas(Vec<AreaEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpirationEntry {
    pub store: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaEntry {
    pub store: String,
    pub area: String,
}

/// The context handed to the answer synthesizer: either an aggregated
/// metadata summary or a bounded set of retrieved document texts.
#[derive(Debug, Clone)]
pub enum ContextPayload {
    Summary(StructuredSummary),
    Documents(Vec<RetrievedDocument>),
}

/// Where an answer's supporting context came from.
#[derive(Debug, Clone)]
pub enum Provenance {
    /// Answered from aggregated metadata of all contracts.
    Aggregated,
    /// Answered from retrieved documents; one entry per document.
    Documents(Vec<DocumentRef>),
}

#[derive(Debug, Clone)]
pub struct DocumentRef {
    pub store_name: String,
    pub contract_number: String,
}

/// A synthesized answer plus its provenance.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub provenance: Provenance,
}
