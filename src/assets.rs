//! Static files served verbatim from the assets directory

use std::path::{Path, PathBuf};

use crate::error::{is_missing, Result, SiteError};
use crate::response::Response;

/// Static-file responder rooted at the assets directory
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
}

impl StaticAssets {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look for a file matching a normalized request path
    ///
    /// `Ok(None)` means "not an asset" and the request falls through to
    /// content rendering; any other IO failure is an error.
    pub async fn probe(&self, path: &str) -> Result<Option<Response>> {
        let full_path = self.root.join(path);

        let metadata = match tokio::fs::metadata(&full_path).await {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(source) => {
                return Err(SiteError::StaticAssetRead {
                    path: full_path,
                    source,
                })
            }
        };
        if !metadata.is_file() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&full_path)
            .await
            .map_err(|source| SiteError::StaticAssetRead {
                path: full_path.clone(),
                source,
            })?;
        let content_type = mime_type(&full_path);
        tracing::debug!("Serving static file {:?} as {}", full_path, content_type);
        Ok(Some(Response::asset(bytes, content_type)))
    }
}

/// MIME type derived from the file extension
pub fn mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
