use crate::config::FlqweenPaths;
use crate::utils::now_millis;
use anyhow::{anyhow, Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// URL prefix under which the uploads directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Disk-backed store for uploaded files. Stored names are prefixed with the
/// upload time in milliseconds and never overwrite an existing file.
#[derive(Clone)]
pub struct UploadStore {
    uploads_dir: PathBuf,
}

impl UploadStore {
    pub fn new(paths: &FlqweenPaths) -> Self {
        Self {
            uploads_dir: paths.uploads_dir.clone(),
        }
    }

    pub async fn save(&self, upload: &UploadedFile) -> Result<StoredFile> {
        fs::create_dir_all(&self.uploads_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create upload directory {}",
                    self.uploads_dir.display()
                )
            })?;

        let name = upload
            .original_name
            .as_deref()
            .map(sanitize_filename)
            .unwrap_or_else(|| "upload".to_string());
        let stamp = now_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let stored_name = if attempt == 0 {
                format!("{stamp}_{name}")
            } else {
                format!("{stamp}_{attempt}_{name}")
            };
            let absolute_path = self.uploads_dir.join(&stored_name);
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&absolute_path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("failed to create {}", absolute_path.display())
                    })
                }
            };
            file.write_all(&upload.data)
                .await
                .with_context(|| format!("failed to write {}", absolute_path.display()))?;
            file.flush().await?;

            tracing::debug!(
                stored_name = %stored_name,
                size_bytes = upload.data.len(),
                "stored upload"
            );
            return Ok(StoredFile {
                public_path: format!("{PUBLIC_PREFIX}/{stored_name}"),
                stored_name,
                absolute_path,
            });
        }

        Err(anyhow!("could not find a free name for upload {name}"))
    }

    /// Best-effort removal used to undo writes when persisting metadata fails.
    pub async fn remove(&self, stored: &StoredFile) {
        if let Err(err) = fs::remove_file(&stored.absolute_path).await {
            tracing::warn!(
                error = %err,
                path = %stored.absolute_path.display(),
                "failed to remove orphaned upload"
            );
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_name: String,
    /// Path clients use to fetch the file, e.g. `/uploads/1700000000000_a.png`.
    pub public_path: String,
    pub absolute_path: PathBuf,
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = Path::new(name)
        .file_name()
        .and_then(|file| file.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}
