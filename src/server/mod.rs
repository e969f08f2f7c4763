//! HTTP server mapping every request onto `SimplSite::handle_request`

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

use crate::response::Response as SiteResponse;
use crate::SimplSite;

/// Start the server
pub async fn start(site: SimplSite, ip: &str, port: u16, open: bool) -> Result<()> {
    let app = Router::new()
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(site);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn fallback_handler(State(site): State<SimplSite>, uri: Uri) -> Response {
    let path = decode_path(uri.path());
    into_http(site.handle_request(&path).await)
}

/// Percent-decode a request path; invalid UTF-8 is replaced lossily
fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

fn into_http(response: SiteResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.content.into_bytes(),
    )
        .into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/blog/hello%20world"), "/blog/hello world");
        assert_eq!(decode_path("/caf%C3%A9"), "/café");
        assert_eq!(decode_path("/plain"), "/plain");
    }

    #[test]
    fn test_into_http() {
        let response = into_http(SiteResponse::asset(b"a{}".to_vec(), "text/css".to_string()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

        let response = into_http(SiteResponse::error(404, "404 Not Found".to_string()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    }
}
