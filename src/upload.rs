//! Default add flow: turns a picked local file into an inline item.

use std::path::{Path, PathBuf};

use anyhow::Context;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::item::RawItem;

pub const UPLOAD_TAGS: [&str; 3] = ["Quality:Upload", "Genre:Misc", "Local"];
const FALLBACK_TITLE: &str = "New Upload";

/// Reads `path` and builds a `data:` URL item for it.
///
/// The id is `local-<epoch millis>`; the title is the file name.
pub fn local_item(path: &Path) -> Result<RawItem> {
    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes)
        .map_err(|_| Error::UnsupportedAsset(path.display().to_string()))?;
    let data_url = format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(&bytes)
    );
    let title = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    Ok(RawItem::new(data_url.clone())
        .with_id(format!("local-{}", Utc::now().timestamp_millis()))
        .with_title(title)
        .with_thumb(data_url)
        .with_tags(UPLOAD_TAGS))
}

/// [`local_item`] on the blocking pool, so a large file never stalls the caller.
pub async fn load_local_item(path: PathBuf) -> anyhow::Result<RawItem> {
    let item = tokio::task::spawn_blocking(move || local_item(&path))
        .await
        .context("local file task panicked")??;
    Ok(item)
}
