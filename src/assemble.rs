//! Context assembly.
//!
//! Turns a routing decision into the bounded context handed to the
//! answer synthesizer: either a structured summary aggregated directly
//! from the metadata collection, or a set of documents retrieved from
//! the corpus index.

use anyhow::Result;

use crate::index::CorpusIndex;
use crate::models::{
    AreaEntry, ContextPayload, ExpirationEntry, MetadataSummary, StructuredSummary,
};
use crate::router::{GlobalIntent, Route};

/// Documents requested for a store-specific question. The answer is
/// expected to come from exactly one store's contract.
const STORE_SPECIFIC_K: usize = 1;

/// Assemble the context payload for a routed question.
///
/// The expiration and area routes aggregate over `metadata` without
/// touching the index, filtering out entries whose relevant field is
/// blank (unknown) and preserving ingestion order. The remaining routes
/// issue a semantic query: up to `general_k` matches for general
/// portfolio-wide questions, exactly one for store-specific ones.
///
/// An empty corpus yields an empty document payload, not an error; the
/// caller still invokes synthesis so the model can report the missing
/// data.
pub async fn assemble(
    route: Route,
    question: &str,
    metadata: &[MetadataSummary],
    index: &dyn CorpusIndex,
    general_k: usize,
) -> Result<ContextPayload> {
    match route {
        Route::Global(GlobalIntent::Expiration) => {
            let contracts = metadata
                .iter()
                .filter(|m| !m.contract_end.is_empty())
                .map(|m| ExpirationEntry {
                    store: m.store_name.clone(),
                    end_date: m.contract_end.clone(),
                })
                .collect();
            Ok(ContextPayload::Summary(StructuredSummary::Expirations(
                contracts,
            )))
        }
        Route::Global(GlobalIntent::Area) => {
            let stores = metadata
                .iter()
                .filter(|m| !m.store_area.is_empty())
                .map(|m| AreaEntry {
                    store: m.store_name.clone(),
                    area: m.store_area.clone(),
                })
                .collect();
            Ok(ContextPayload::Summary(StructuredSummary::Areas(stores)))
        }
        Route::Global(GlobalIntent::General) => {
            let docs = index.semantic_query(question, general_k).await?;
            Ok(ContextPayload::Documents(docs))
        }
        Route::StoreSpecific => {
            let docs = index.semantic_query(question, STORE_SPECIFIC_K).await?;
            Ok(ContextPayload::Documents(docs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RetrievedDocument;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fake index that records the requested `k` and returns the first
    /// `k` of its canned documents.
    struct FakeIndex {
        docs: Vec<RetrievedDocument>,
        requested_k: Mutex<Vec<usize>>,
    }

    impl FakeIndex {
        fn new(docs: Vec<RetrievedDocument>) -> Self {
            Self {
                docs,
                requested_k: Mutex::new(Vec::new()),
            }
        }

        fn last_k(&self) -> usize {
            *self.requested_k.lock().unwrap().last().unwrap()
        }
    }

    #[async_trait]
    impl CorpusIndex for FakeIndex {
        async fn semantic_query(&self, _text: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
            self.requested_k.lock().unwrap().push(k);
            Ok(self.docs.iter().take(k).cloned().collect())
        }

        async fn is_empty(&self) -> Result<bool> {
            Ok(self.docs.is_empty())
        }
    }

    fn doc(id: &str, store: &str) -> RetrievedDocument {
        RetrievedDocument {
            id: id.to_string(),
            text: format!("{{\"loja\":\"{}\"}}", store),
            metadata: MetadataSummary {
                store_name: store.to_string(),
                ..Default::default()
            },
            score: 0.5,
        }
    }

    fn summary(store: &str, end: &str, area: &str) -> MetadataSummary {
        MetadataSummary {
            store_name: store.to_string(),
            contract_end: end.to_string(),
            store_area: area.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_expiration_filters_blank_end_dates() {
        let metadata = vec![
            summary("A", "2026-01-01", ""),
            summary("B", "", "120"),
            summary("C", "2027-06-30", "90"),
        ];
        let index = FakeIndex::new(Vec::new());

        let payload = assemble(
            Route::Global(GlobalIntent::Expiration),
            "Quais os vencimentos de todos os contratos?",
            &metadata,
            &index,
            100,
        )
        .await
        .unwrap();

        match payload {
            ContextPayload::Summary(StructuredSummary::Expirations(entries)) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].store, "A");
                assert_eq!(entries[0].end_date, "2026-01-01");
                assert_eq!(entries[1].store, "C");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_area_filters_blank_areas() {
        let metadata = vec![summary("A", "2026-01-01", ""), summary("B", "", "120")];
        let index = FakeIndex::new(Vec::new());

        let payload = assemble(
            Route::Global(GlobalIntent::Area),
            "Qual a área de todas as lojas?",
            &metadata,
            &index,
            100,
        )
        .await
        .unwrap();

        match payload {
            ContextPayload::Summary(StructuredSummary::Areas(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].store, "B");
                assert_eq!(entries[0].area, "120");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_general_requests_configured_cap() {
        let index = FakeIndex::new(vec![doc("doc_0", "A"), doc("doc_1", "B")]);

        let payload = assemble(
            Route::Global(GlobalIntent::General),
            "Quantas lojas ficam no piso L2?",
            &[],
            &index,
            100,
        )
        .await
        .unwrap();

        assert_eq!(index.last_k(), 100);
        match payload {
            ContextPayload::Documents(docs) => assert_eq!(docs.len(), 2),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_specific_requests_exactly_one() {
        let index = FakeIndex::new(vec![doc("doc_0", "B"), doc("doc_1", "A")]);

        let payload = assemble(Route::StoreSpecific, "Qual a área da loja B?", &[], &index, 100)
            .await
            .unwrap();

        assert_eq!(index.last_k(), 1);
        match payload {
            ContextPayload::Documents(docs) => {
                assert_eq!(docs.len(), 1);
                assert_eq!(docs[0].metadata.store_name, "B");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_corpus_yields_empty_documents() {
        let index = FakeIndex::new(Vec::new());

        let payload = assemble(Route::StoreSpecific, "Qual a área da loja B?", &[], &index, 100)
            .await
            .unwrap();

        match payload {
            ContextPayload::Documents(docs) => assert!(docs.is_empty()),
            other => panic!("unexpected payload: {:?}", other),
        }
    }
}
