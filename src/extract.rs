//! Metadata extraction from contract records.
//!
//! A contract record is an arbitrarily nested JSON document with a
//! `loja` (store) object and a `contratos` array whose first element is
//! authoritative. [`extract_metadata`] projects it onto a flat
//! [`MetadataSummary`]; absent paths resolve to empty strings, so the
//! extractor never fails on malformed or partial records.

use serde_json::Value;

use crate::models::MetadataSummary;

/// Project a contract record onto its flat metadata summary.
///
/// Total function: any missing or mistyped path yields `""` for the
/// corresponding field. Same input always yields the same output.
pub fn extract_metadata(record: &Value) -> MetadataSummary {
    let store = record.get("loja");
    let contract = record
        .get("contratos")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let object = contract.and_then(|c| c.get("objeto"));
    let term = contract.and_then(|c| c.get("vigencia"));

    MetadataSummary {
        store_name: string_field(store, "nome_fantasia"),
        cnpj: string_field(store, "cnpj"),
        contract_number: string_field(contract, "numero_contrato"),
        store_area: string_field(object, "area_privativa"),
        contract_start: string_field(term, "data_inicial"),
        contract_end: string_field(term, "data_final"),
        floor: string_field(object, "piso"),
        store_number: string_field(object, "loja"),
    }
}

/// Read `parent[key]` as text. Numbers are rendered as their JSON
/// decimal text, since `area_privativa` appears both as a string and
/// as a number in the source corpus.
fn string_field(parent: Option<&Value>, key: &str) -> String {
    match parent.and_then(|p| p.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
