use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // One row per ingested contract record. The whole table is replaced
    // wholesale on every ingestion run, so `position` (ingestion order)
    // is the only ordering that matters. The embedding BLOB is nullable:
    // rows ingested while the provider was unreachable stay unembedded.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL UNIQUE,
            body TEXT NOT NULL,
            store_name TEXT NOT NULL DEFAULT '',
            cnpj TEXT NOT NULL DEFAULT '',
            contract_number TEXT NOT NULL DEFAULT '',
            store_area TEXT NOT NULL DEFAULT '',
            contract_start TEXT NOT NULL DEFAULT '',
            contract_end TEXT NOT NULL DEFAULT '',
            floor TEXT NOT NULL DEFAULT '',
            store_number TEXT NOT NULL DEFAULT '',
            dedup_hash TEXT NOT NULL,
            embedding BLOB
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_store_name ON documents(store_name)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
