//! Commands behind the `davtool` binary.
//!
//! Each command takes a credential-bearing blob URL (see
//! [`BlobStoreConfig::blob_url`]) and performs one store operation.

use anyhow::{Context, Result, bail};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::blob_store::{Blob, BlobStoreConfig, DavBlobStore};

/// Build a store client for `url` and return the object name it points at.
///
/// Fails when the URL names the collection rather than an object.
pub fn store_for(url: &str) -> Result<(DavBlobStore, String)> {
    let (config, name) = BlobStoreConfig::from_url(url)?;
    if name.is_empty() {
        bail!("{url} names the blob collection, not an object");
    }
    Ok((DavBlobStore::new(config)?, name))
}

/// Upload `file` to the object named by `url`. Returns the object name.
pub async fn put(url: &str, file: &Path) -> Result<String> {
    let (store, name) = store_for(url)?;
    let source = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("opening {}", file.display()))?;
    store.upload(&name, source).await?;
    tracing::info!(%name, file = %file.display(), "uploaded blob");
    Ok(name)
}

/// Download the object named by `url` into `file`. Returns the object name and bytes written.
pub async fn get(url: &str, file: &Path) -> Result<(String, u64)> {
    let (store, name) = store_for(url)?;
    let mut reader = store.download(&name).await?;
    let mut target = tokio::fs::File::create(file)
        .await
        .with_context(|| format!("creating {}", file.display()))?;
    let written = tokio::io::copy(&mut reader, &mut target)
        .await
        .with_context(|| format!("writing {}", file.display()))?;
    target.flush().await?;
    reader.close();
    tracing::info!(%name, file = %file.display(), written, "downloaded blob");
    Ok((name, written))
}

/// Delete the object named by `url`. Returns the object name.
pub async fn delete(url: &str) -> Result<String> {
    let (store, name) = store_for(url)?;
    store.delete(&name).await?;
    tracing::info!(%name, "deleted blob");
    Ok(name)
}

/// List the collection `url` lives in, sorted by path. Any object name in `url` is ignored.
pub async fn list(url: &str) -> Result<Vec<Blob>> {
    let (config, _) = BlobStoreConfig::from_url(url)?;
    let mut blobs = DavBlobStore::new(config)?.list().await?;
    blobs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(blobs)
}
