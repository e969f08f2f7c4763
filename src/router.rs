//! Request path -> content file resolution

use std::path::{Path, PathBuf};

use crate::config::{ContentSource, SiteConfig};
use crate::error::{Result, SiteError};

const MARKDOWN_EXT: &str = ".md";
const INDEX: &str = "index";

/// Where a request's content lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub content_type: String,
    /// Directory of the matched content source
    pub source_dir: PathBuf,
    /// File path relative to `source_dir`, always ending in `.md`
    pub relative_path: String,
    /// Original request path with a leading slash
    pub route: String,
}

impl ResolvedRoute {
    pub fn file_path(&self) -> PathBuf {
        self.source_dir.join(&self.relative_path)
    }
}

/// Strip the leading slash; the empty path becomes `index`
///
/// Paths that try to leave the site directories (`..`, backslashes, NUL)
/// are rejected.
pub fn normalize_path(path: &str) -> Result<String> {
    let path = path.trim_start_matches('/');
    if path.contains('\\') || path.contains('\0') || path.split('/').any(|seg| seg == "..") {
        return Err(SiteError::InvalidPath(path.to_string()));
    }
    if path.is_empty() {
        Ok(INDEX.to_string())
    } else {
        Ok(path.to_string())
    }
}

/// Maps normalized request paths onto configured content sources
#[derive(Debug, Clone)]
pub struct Router {
    sources: Vec<ContentSource>,
    default_content_type: String,
}

impl Router {
    pub fn new(sources: Vec<ContentSource>, default_content_type: &str) -> Self {
        Self {
            sources,
            default_content_type: default_content_type.to_string(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.content_sources.clone(), &config.default_content_type)
    }

    /// Resolve a normalized path (see [`normalize_path`])
    ///
    /// The first source, in declaration order, whose route prefixes the path
    /// wins. Without a match the full path is looked up in the default
    /// content type's directory.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute> {
        let route = format!("/{}", path);

        if let Some(source) = self.sources.iter().find(|s| path.starts_with(&s.route)) {
            let relative_path = to_markdown_file(&path[source.route.len()..]);
            tracing::debug!(
                "Route {} matched source '{}' -> {}",
                route,
                source.content_type,
                relative_path
            );
            return Ok(ResolvedRoute {
                content_type: source.content_type.clone(),
                source_dir: source.path.clone(),
                relative_path,
                route,
            });
        }

        let source = self
            .source_for_type(&self.default_content_type)
            .ok_or_else(|| SiteError::UnknownContentType(self.default_content_type.clone()))?;
        tracing::debug!(
            "Route {} fell back to default type '{}'",
            route,
            self.default_content_type
        );
        Ok(ResolvedRoute {
            content_type: source.content_type.clone(),
            source_dir: source.path.clone(),
            relative_path: to_markdown_file(path),
            route,
        })
    }

    /// Directory for a content type
    pub fn source_dir(&self, content_type: &str) -> Result<&Path> {
        self.source_for_type(content_type)
            .map(|s| s.path.as_path())
            .ok_or_else(|| SiteError::UnknownContentType(content_type.to_string()))
    }

    pub fn sources(&self) -> &[ContentSource] {
        &self.sources
    }

    fn source_for_type(&self, content_type: &str) -> Option<&ContentSource> {
        self.sources.iter().find(|s| s.content_type == content_type)
    }
}

fn to_markdown_file(path: &str) -> String {
    let mut file = path.to_string();
    if file.is_empty() || file.ends_with('/') {
        file.push_str(INDEX);
    }
    if !file.ends_with(MARKDOWN_EXT) {
        file.push_str(MARKDOWN_EXT);
    }
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new(
            vec![
                ContentSource::new("content/blog", "blog", "blog/"),
                ContentSource::new("content/projects", "project", "projects/"),
                ContentSource::new("content", "page", ""),
            ],
            "page",
        )
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/").unwrap(), "index");
        assert_eq!(normalize_path("").unwrap(), "index");
        assert_eq!(normalize_path("/blog/hello").unwrap(), "blog/hello");
        assert!(matches!(
            normalize_path("/../etc/passwd"),
            Err(SiteError::InvalidPath(_))
        ));
        assert!(normalize_path("/a\\b").is_err());
    }

    #[test]
    fn test_prefix_is_stripped_and_md_appended() {
        let resolved = router().resolve("blog/hello").unwrap();
        assert_eq!(resolved.content_type, "blog");
        assert_eq!(resolved.relative_path, "hello.md");
        assert_eq!(resolved.route, "/blog/hello");
        assert_eq!(resolved.file_path(), PathBuf::from("content/blog/hello.md"));
    }

    #[test]
    fn test_existing_md_extension_is_kept() {
        let resolved = router().resolve("projects/rust.md").unwrap();
        assert_eq!(resolved.content_type, "project");
        assert_eq!(resolved.relative_path, "rust.md");
    }

    #[test]
    fn test_first_match_in_declaration_order_wins() {
        let router = Router::new(
            vec![
                ContentSource::new("content", "page", ""),
                ContentSource::new("content/blog", "blog", "blog/"),
            ],
            "page",
        );
        let resolved = router.resolve("blog/hello").unwrap();
        assert_eq!(resolved.content_type, "page");
        assert_eq!(resolved.relative_path, "blog/hello.md");
    }

    #[test]
    fn test_fallback_to_default_type() {
        let router = Router::new(
            vec![
                ContentSource::new("content/blog", "blog", "blog/"),
                ContentSource::new("content/pages", "page", "pages/"),
            ],
            "page",
        );
        let resolved = router.resolve("about").unwrap();
        assert_eq!(resolved.content_type, "page");
        assert_eq!(resolved.file_path(), PathBuf::from("content/pages/about.md"));
        assert_eq!(resolved.route, "/about");
    }

    #[test]
    fn test_unknown_default_type() {
        let router = Router::new(vec![ContentSource::new("content/blog", "blog", "blog/")], "page");
        assert!(matches!(
            router.resolve("about"),
            Err(SiteError::UnknownContentType(t)) if t == "page"
        ));
        assert!(router.source_dir("blog").is_ok());
        assert!(router.source_dir("page").is_err());
    }

    #[test]
    fn test_directory_paths_resolve_to_index() {
        let router = router();
        assert_eq!(router.resolve("blog/").unwrap().relative_path, "index.md");
        assert_eq!(router.resolve("docs/").unwrap().relative_path, "docs/index.md");
        assert_eq!(router.resolve("index").unwrap().relative_path, "index.md");
    }
}
