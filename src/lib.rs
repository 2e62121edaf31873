//! # Lease Assist
//!
//! A question-answering assistant for a fixed corpus of shopping-center
//! lease contracts. Questions (typically in Portuguese) are routed by
//! keyword classification, a bounded context is assembled from either
//! aggregated contract metadata or semantic retrieval over an embedded
//! corpus, and answer synthesis is delegated to an OpenAI-compatible
//! chat endpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────────┐   ┌───────────┐
//! │ JSON files │──▶│   Ingestion    │──▶│  SQLite    │
//! │ (contracts)│   │ extract+embed  │   │ docs+vecs  │
//! └────────────┘   └───────────────┘   └─────┬─────┘
//!                                            │
//!        question ──▶ Router ──▶ Assembler ──┤
//!                                            ▼
//!                                   ┌────────────────┐
//!                                   │  Synthesizer    │──▶ answer
//!                                   │ (chat endpoint) │    + sources
//!                                   └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lease init                                  # create database
//! lease ingest ./contratos_json               # index the corpus
//! lease ask "Quais os vencimentos de todos os contratos?"
//! lease ask "Qual a área da loja X?" --sources
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Contract metadata extraction |
//! | [`router`] | Keyword-driven question routing |
//! | [`assemble`] | Context assembly per route |
//! | [`index`] | Corpus index (semantic retrieval) |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`synth`] | Answer synthesizer boundary |
//! | [`ingest`] | Bulk corpus ingestion |
//! | [`session`] | Per-session query context |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod ask;
pub mod assemble;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod router;
pub mod session;
pub mod stores;
pub mod synth;
