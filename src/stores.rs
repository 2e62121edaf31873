use anyhow::Result;

use crate::config::Config;
use crate::session::Session;

/// List the ingested metadata collection, one line per store.
pub async fn run_stores(config: &Config) -> Result<()> {
    let session = Session::open(config).await?;

    if session.metadata().is_empty() {
        println!("No contracts ingested. Run `lease ingest <dir>` first.");
        session.close().await;
        return Ok(());
    }

    println!(
        "{:<32} {:<16} {:<6} {:<12}",
        "STORE", "CONTRACT", "FLOOR", "END DATE"
    );
    for m in session.metadata() {
        println!(
            "{:<32} {:<16} {:<6} {:<12}",
            blank_as_unknown(&m.store_name),
            blank_as_unknown(&m.contract_number),
            blank_as_unknown(&m.floor),
            blank_as_unknown(&m.contract_end),
        );
    }
    println!("total: {}", session.metadata().len());

    session.close().await;
    Ok(())
}

fn blank_as_unknown(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
