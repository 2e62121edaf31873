//! Answer synthesis boundary.
//!
//! The synthesizer receives exactly one fixed system instruction (the
//! contracts-assistant persona, with today's date interpolated) and
//! exactly one user message carrying the assembled context followed by
//! the original question. No conversation history is kept; every
//! question is answered from a fresh, stateless prompt. The message
//! shapes here are a contract with the external endpoint, not a
//! tunable.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::config::SynthesizerConfig;
use crate::embedding::post_json_with_retry;
use crate::models::ContextPayload;

/// External language-model endpoint.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Complete a single system + user turn and return the answer text.
    async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String>;
}

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Render a date as `"DD de <mês> de YYYY"`.
fn format_date_pt(date: NaiveDate) -> String {
    let month = MONTHS_PT[date.month0() as usize];
    format!("{:02} de {} de {}", date.day(), month, date.year())
}

/// Build the fixed system instruction with `today` interpolated.
pub fn system_instruction(today: NaiveDate) -> String {
    format!(
        "Você é um assistente especializado em contratos do Shopping Center Iguatemi. \n\
         \n\
         Você lida com dois tipos de consultas:\n\
         \n\
         1. Consultas globais sobre todos os contratos (ex.: datas de vencimento dos contratos, número total de lojas)\n\
         Para essas consultas, você receberá metadados pré-processados e trechos relevantes dos contratos.\n\
         Forneça informações agregadas com base nos metadados fornecidos.\n\
         Seja detalhado, mas conciso.\n\
         \n\
         2. Consultas específicas sobre lojas individuais\n\
         Foque nos detalhes do contrato da loja em questão.\n\
         Forneça informações precisas apenas a partir dos documentos dessa loja.\n\
         \n\
         Sempre:\n\
         Dê respostas diretas e baseadas nos documentos e metadados fornecidos.\n\
         Se houver falta de informação ou algo estiver incerto, mencione isso explicitamente.\n\
         Formate números e datas de maneira consistente.\n\
         Mantenha as respostas curtas e objetivas.\n\
         \n\
         Hoje é {}",
        format_date_pt(today)
    )
}

/// Build the single user message for an assembled context payload.
///
/// Metadata summaries are serialized as JSON; retrieved documents are
/// concatenated with blank-line separators. An empty document payload
/// produces an empty context section; synthesis is still invoked so
/// the model can state that no data is available.
pub fn user_content(payload: &ContextPayload, question: &str) -> Result<String> {
    match payload {
        ContextPayload::Summary(summary) => {
            let json = serde_json::to_string(summary)?;
            Ok(format!("Metadata summary: {}\n\nQuestion: {}", json, question))
        }
        ContextPayload::Documents(docs) => {
            let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
            Ok(format!(
                "Context: {}\n\nQuestion: {}",
                texts.join("\n\n"),
                question
            ))
        }
    }
}

/// Synthesizer backed by the OpenAI chat-completions API.
///
/// Temperature is pinned to zero and the response length is bounded by
/// `synthesizer.max_tokens`. Requires `OPENAI_API_KEY`.
pub struct OpenAiChat {
    config: SynthesizerConfig,
}

impl OpenAiChat {
    pub fn new(config: SynthesizerConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            anyhow::bail!("OPENAI_API_KEY environment variable not set");
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl Synthesizer for OpenAiChat {
    async fn complete(&self, system_instruction: &str, user_content: &str) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_instruction },
                { "role": "user", "content": user_content },
            ],
            "temperature": 0,
            "max_tokens": self.config.max_tokens,
        });

        let json = post_json_with_retry(
            "https://api.openai.com/v1/chat/completions",
            Some(&api_key),
            &body,
            self.config.timeout_secs,
            self.config.max_retries,
        )
        .await?;

        let answer = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing message content"))?;

        Ok(answer.to_string())
    }
}
