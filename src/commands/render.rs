//! Render a single request path to stdout

use anyhow::Result;
use std::io::Write;

use crate::SimplSite;

/// Render `path` as the server would and write the body to stdout
///
/// Returns whether the response was successful.
pub async fn run(site: &SimplSite, path: &str) -> Result<bool> {
    let response = site.handle_request(path).await;
    eprintln!(
        "{} {} ({} bytes)",
        response.status,
        response.content_type,
        response.content.len()
    );

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(response.content.as_bytes())?;
    stdout.flush()?;
    Ok(response.is_success())
}
