//! Raw external-response archival (spec §6 "Persisted state"). Weather
//! and price responses are written verbatim alongside the database so a
//! run can be replayed offline.

use anyhow::{Context, Result};

pub async fn write_raw(archive_dir: &str, kind: &str, local_ts_tag: &str, body: &str) -> Result<()> {
    tokio::fs::create_dir_all(archive_dir)
        .await
        .with_context(|| format!("creating archive dir {archive_dir}"))?;
    let path = format!("{archive_dir}/{kind}-{local_ts_tag}.json");
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("writing archive file {path}"))?;
    Ok(())
}
