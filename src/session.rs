//! Per-session question answering.
//!
//! A [`Session`] is the explicitly constructed context for the query
//! path: the corpus index handle plus the metadata collection, loaded
//! once when the session opens and read-only from then on. One session
//! lives for one CLI invocation (or one caller-defined scope) and is
//! discarded at the end; there is no ambient global state.

use anyhow::Result;

use crate::assemble::assemble;
use crate::config::Config;
use crate::db;
use crate::index::{CorpusIndex, SqliteIndex};
use crate::models::{Answer, ContextPayload, DocumentRef, MetadataSummary, Provenance};
use crate::router::classify;
use crate::synth::{system_instruction, user_content, Synthesizer};

pub struct Session {
    index: SqliteIndex,
    metadata: Vec<MetadataSummary>,
    general_k: usize,
}

impl Session {
    /// Connect to the database and load the metadata collection.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let index = SqliteIndex::new(pool, config.embedding.clone());
        let metadata = index.load_metadata().await?;
        Ok(Self {
            index,
            metadata,
            general_k: config.retrieval.general_k,
        })
    }

    pub fn metadata(&self) -> &[MetadataSummary] {
        &self.metadata
    }

    /// Route the question, assemble its context, and synthesize an
    /// answer. Each call is stateless: nothing carries over between
    /// questions.
    pub async fn answer(&self, question: &str, synthesizer: &dyn Synthesizer) -> Result<Answer> {
        answer_question(
            question,
            &self.metadata,
            &self.index,
            self.general_k,
            synthesizer,
        )
        .await
    }

    pub async fn close(self) {
        self.index.pool().close().await;
    }
}

/// The full question-answering flow over explicit collaborators.
pub async fn answer_question(
    question: &str,
    metadata: &[MetadataSummary],
    index: &dyn CorpusIndex,
    general_k: usize,
    synthesizer: &dyn Synthesizer,
) -> Result<Answer> {
    let route = classify(question);
    let payload = assemble(route, question, metadata, index, general_k).await?;

    let today = chrono::Local::now().date_naive();
    let system = system_instruction(today);
    let user = user_content(&payload, question)?;

    let text = synthesizer.complete(&system, &user).await?;

    let provenance = match &payload {
        ContextPayload::Summary(_) => Provenance::Aggregated,
        ContextPayload::Documents(docs) => Provenance::Documents(
            docs.iter()
                .map(|d| DocumentRef {
                    store_name: d.metadata.store_name.clone(),
                    contract_number: d.metadata.contract_number.clone(),
                })
                .collect(),
        ),
    };

    Ok(Answer { text, provenance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RetrievedDocument;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeIndex {
        docs: Vec<RetrievedDocument>,
    }

    #[async_trait]
    impl CorpusIndex for FakeIndex {
        async fn semantic_query(&self, _text: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
            Ok(self.docs.iter().take(k).cloned().collect())
        }

        async fn is_empty(&self) -> Result<bool> {
            Ok(self.docs.is_empty())
        }
    }

    /// Records the prompts it receives and returns a canned answer.
    struct FakeSynthesizer {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeSynthesizer {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn last_user_content(&self) -> String {
            self.calls.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl Synthesizer for FakeSynthesizer {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok("resposta".to_string())
        }
    }

    fn store_doc(store: &str, contract: &str) -> RetrievedDocument {
        RetrievedDocument {
            id: "doc_0".to_string(),
            text: format!("{{\"loja\":\"{}\"}}", store),
            metadata: MetadataSummary {
                store_name: store.to_string(),
                contract_number: contract.to_string(),
                ..Default::default()
            },
            score: 0.9,
        }
    }

    #[tokio::test]
    async fn test_expiration_question_uses_aggregated_metadata() {
        let metadata = vec![
            MetadataSummary {
                store_name: "A".to_string(),
                contract_end: "2026-01-01".to_string(),
                ..Default::default()
            },
            MetadataSummary {
                store_name: "B".to_string(),
                store_area: "120".to_string(),
                ..Default::default()
            },
        ];
        let index = FakeIndex { docs: Vec::new() };
        let synth = FakeSynthesizer::new();

        let answer = answer_question(
            "Quais os vencimentos de todos os contratos?",
            &metadata,
            &index,
            100,
            &synth,
        )
        .await
        .unwrap();

        assert_eq!(answer.text, "resposta");
        assert!(matches!(answer.provenance, Provenance::Aggregated));
        assert!(synth.last_user_content().starts_with(
            "Metadata summary: {\"contracts\":[{\"store\":\"A\",\"end_date\":\"2026-01-01\"}]}"
        ));
    }

    #[tokio::test]
    async fn test_store_question_carries_document_provenance() {
        let index = FakeIndex {
            docs: vec![store_doc("B", "CT-0002")],
        };
        let synth = FakeSynthesizer::new();

        let answer = answer_question("Qual a área da loja B?", &[], &index, 100, &synth)
            .await
            .unwrap();

        match answer.provenance {
            Provenance::Documents(refs) => {
                assert_eq!(refs.len(), 1);
                assert_eq!(refs[0].store_name, "B");
                assert_eq!(refs[0].contract_number, "CT-0002");
            }
            other => panic!("unexpected provenance: {:?}", other),
        }
        assert!(synth.last_user_content().starts_with("Context: {\"loja\":\"B\"}"));
    }

    #[tokio::test]
    async fn test_empty_corpus_still_invokes_synthesis() {
        let index = FakeIndex { docs: Vec::new() };
        let synth = FakeSynthesizer::new();

        let answer = answer_question("Qual a área da loja B?", &[], &index, 100, &synth)
            .await
            .unwrap();

        assert_eq!(answer.text, "resposta");
        assert_eq!(
            synth.last_user_content(),
            "Context: \n\nQuestion: Qual a área da loja B?"
        );
        match answer.provenance {
            Provenance::Documents(refs) => assert!(refs.is_empty()),
            other => panic!("unexpected provenance: {:?}", other),
        }
    }
}
