//! Bulk ingestion of contract JSON files.
//!
//! Scans a directory for contract records, extracts flat metadata from
//! each, and replaces the entire corpus wholesale inside a single
//! transaction. There is no incremental update path: every run rebuilds
//! the index from scratch, which keeps document ids (`doc_{position}`)
//! stable for a given directory state. Embedding happens after the
//! replace commits and is non-fatal; rows left without vectors are
//! reported in the run summary and simply excluded from semantic
//! retrieval.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::extract::extract_metadata;
use crate::models::MetadataSummary;

/// One contract file, parsed and ready for insertion.
#[derive(Debug, Clone)]
pub struct ContractFile {
    pub relative_path: String,
    /// Verbatim text of the contract file.
    pub body: String,
    pub metadata: MetadataSummary,
    pub dedup_hash: String,
}

pub async fn run_ingest(config: &Config, directory: &Path, dry_run: bool) -> Result<()> {
    let files = scan_directory(config, directory)?;

    if dry_run {
        println!("ingest {} (dry-run)", directory.display());
        println!("  contract files found: {}", files.len());
        return Ok(());
    }

    let pool = db::connect(config).await?;
    replace_corpus(&pool, &files).await?;

    let mut embedded = 0u64;
    let mut pending = files.len() as u64;
    let mut model_name = None;
    if config.embedding.is_enabled() {
        // Embedding is non-fatal: a misconfigured or unreachable provider
        // leaves the documents indexed without vectors.
        match embedding::create_provider(&config.embedding) {
            Ok(provider) => {
                model_name = Some(provider.model_name().to_string());
                (embedded, pending) = embed_corpus(config, &pool, &files).await;
            }
            Err(e) => eprintln!("Warning: embedding provider unavailable: {}", e),
        }
    }

    println!("ingest {}", directory.display());
    println!("  contract files: {}", files.len());
    println!("  documents indexed: {}", files.len());
    match model_name {
        Some(model) => {
            println!("  embedding model: {}", model);
            println!("  embeddings written: {}", embedded);
            println!("  embeddings pending: {}", pending);
        }
        None => println!("  embeddings skipped: {}", pending),
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Enumerate and parse all contract files under `directory`.
///
/// Files are sorted by relative path so that ingestion order, and with
/// it the `doc_{position}` ids, is deterministic for a given directory
/// state. Any unreadable or malformed file aborts the scan; no partial
/// corpus is ever written.
pub fn scan_directory(config: &Config, directory: &Path) -> Result<Vec<ContractFile>> {
    if !directory.is_dir() {
        bail!("Ingest directory does not exist: {}", directory.display());
    }

    let include_set = build_globset(&config.ingest.include_globs)?;
    let exclude_set = build_globset(&config.ingest.exclude_globs)?;

    let mut files = Vec::new();

    for entry in WalkDir::new(directory) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(directory).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(parse_contract_file(path, &rel_str)?);
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

fn parse_contract_file(path: &Path, relative_path: &str) -> Result<ContractFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contract file: {}", path.display()))?;

    let record: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse contract file: {}", path.display()))?;

    let metadata = extract_metadata(&record);

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let dedup_hash = format!("{:x}", hasher.finalize());

    Ok(ContractFile {
        relative_path: relative_path.to_string(),
        body: content,
        metadata,
        dedup_hash,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

/// Delete-all-then-reinsert inside one transaction. Ids are derived
/// from ingestion order; there is no per-document update path.
async fn replace_corpus(pool: &SqlitePool, files: &[ContractFile]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM documents").execute(&mut *tx).await?;

    for (position, file) in files.iter().enumerate() {
        let m = &file.metadata;
        sqlx::query(
            r#"
            INSERT INTO documents
                (id, position, body, store_name, cnpj, contract_number, store_area,
                 contract_start, contract_end, floor, store_number, dedup_hash, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(format!("doc_{}", position))
        .bind(position as i64)
        .bind(&file.body)
        .bind(&m.store_name)
        .bind(&m.cnpj)
        .bind(&m.contract_number)
        .bind(&m.store_area)
        .bind(&m.contract_start)
        .bind(&m.contract_end)
        .bind(&m.floor)
        .bind(&m.store_number)
        .bind(&file.dedup_hash)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Embed document bodies in batches. Returns (written, pending);
/// batch failures are warned about and counted, never fatal.
async fn embed_corpus(config: &Config, pool: &SqlitePool, files: &[ContractFile]) -> (u64, u64) {
    let mut written = 0u64;
    let mut pending = 0u64;
    let batch_size = config.embedding.batch_size.max(1);

    for (batch_index, batch) in files.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|f| f.body.clone()).collect();

        match embedding::embed_texts(&config.embedding, &texts).await {
            Ok(vectors) => {
                for (offset, vector) in vectors.iter().enumerate() {
                    let position = batch_index * batch_size + offset;
                    let blob = embedding::vec_to_blob(vector);
                    let result = sqlx::query("UPDATE documents SET embedding = ? WHERE position = ?")
                        .bind(&blob)
                        .bind(position as i64)
                        .execute(pool)
                        .await;
                    match result {
                        Ok(_) => written += 1,
                        Err(e) => {
                            eprintln!("Warning: failed to store embedding for doc_{}: {}", position, e);
                            pending += 1;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("Warning: embedding batch failed: {}", e);
                pending += batch.len() as u64;
            }
        }
    }

    (written, pending)
}
