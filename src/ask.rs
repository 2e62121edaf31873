//! CLI entry point for asking a question.
//!
//! Opens a session, answers one question, and prints the answer plus
//! (optionally) the provenance list: per retrieved document the store
//! name and contract number, or a note that the answer was built from
//! aggregated metadata.

use anyhow::Result;

use crate::config::Config;
use crate::models::Provenance;
use crate::session::Session;
use crate::synth::OpenAiChat;

pub async fn run_ask(config: &Config, question: &str, show_sources: bool) -> Result<()> {
    let synthesizer = OpenAiChat::new(config.synthesizer.clone())?;
    let session = Session::open(config).await?;

    let answer = session.answer(question, &synthesizer).await;
    session.close().await;
    let answer = answer?;

    println!("{}", answer.text);

    if show_sources {
        println!();
        match &answer.provenance {
            Provenance::Aggregated => {
                println!("Answered from aggregated metadata of all contracts.");
            }
            Provenance::Documents(refs) if refs.is_empty() => {
                println!("No documents were retrieved for this question.");
            }
            Provenance::Documents(refs) => {
                println!("References:");
                for doc_ref in refs {
                    println!(
                        "  store: {} / contract: {}",
                        doc_ref.store_name, doc_ref.contract_number
                    );
                }
            }
        }
    }

    Ok(())
}
