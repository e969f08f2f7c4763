//! The `{content, contentType, status, size}` result handed back to the HTTP layer

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Content type used for every rendered page and error body
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Response payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Rendered HTML or a textual error message
    Text(String),
    /// Static asset bytes, served verbatim
    Bytes(Vec<u8>),
}

impl Body {
    pub fn len(&self) -> usize {
        match self {
            Body::Text(text) => text.len(),
            Body::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Bytes(bytes) => bytes,
        }
    }

    /// Text view of the body, `None` for binary assets
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Bytes(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Text(text) => text.into_bytes(),
            Body::Bytes(bytes) => bytes,
        }
    }
}

/// Result of a single `handle_request` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content: Body,
    pub content_type: String,
    pub status: u16,
    /// Byte size, reported for static assets
    pub size: Option<usize>,
}

impl Response {
    /// A successfully rendered page
    pub fn html(content: String) -> Self {
        Self {
            content: Body::Text(content),
            content_type: HTML_CONTENT_TYPE.to_string(),
            status: STATUS_OK,
            size: None,
        }
    }

    /// A static asset returned byte-for-byte
    pub fn asset(bytes: Vec<u8>, content_type: String) -> Self {
        let size = bytes.len();
        Self {
            content: Body::Bytes(bytes),
            content_type,
            status: STATUS_OK,
            size: Some(size),
        }
    }

    /// An error response with a human-readable body
    pub fn error(status: u16, message: String) -> Self {
        Self {
            content: Body::Text(message),
            content_type: HTML_CONTENT_TYPE.to_string(),
            status,
            size: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generic user-visible text for an error status
pub fn status_text(status: u16) -> &'static str {
    match status {
        STATUS_BAD_REQUEST => "400 Bad Request",
        STATUS_NOT_FOUND => "404 Not Found",
        _ => "500 Internal Server Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_response_reports_size() {
        let response = Response::asset(vec![1, 2, 3], "image/png".to_string());
        assert_eq!(response.size, Some(3));
        assert_eq!(response.status, STATUS_OK);
        assert!(response.content.as_text().is_none());
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(STATUS_NOT_FOUND, status_text(404).to_string());
        assert!(!response.is_success());
        assert_eq!(response.content.as_text(), Some("404 Not Found"));
        assert_eq!(response.content_type, "text/html");
    }
}
