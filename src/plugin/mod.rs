//! Plugin module - capability trait, registry, pipeline and built-in plugins
//!
//! A plugin has two hooks, both defaulting to no-ops:
//! - `transform` rewrites the rendered HTML and may contribute metadata
//! - `extend_template` adds fields to the template context
//!
//! Whether a plugin applies to a given request is the plugin's own decision;
//! the pipeline calls every hook of every plugin.

mod last_modified;
mod pipeline;
mod registry;
mod toc;

pub use last_modified::{LastModifiedOptions, LastModifiedPlugin};
pub use pipeline::PluginPipeline;
pub use registry::{PluginFactory, PluginRegistry};
pub use toc::{TableOfContentsPlugin, TocOptions};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::content::Metadata;
use crate::templates::TemplateContext;

/// Read-only per-request snapshot passed to `transform`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginContext {
    pub content_type: String,
    /// Request path with a leading slash
    pub route: String,
    pub template_dir: PathBuf,
    /// Content type -> source directory
    pub content_sources: IndexMap<String, PathBuf>,
    pub site_url: String,
    /// Content file being rendered
    pub source_path: PathBuf,
}

/// Output of a `transform` hook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformed {
    pub content: String,
    /// Keys to merge over the accumulated metadata
    pub metadata: Option<Metadata>,
}

impl Transformed {
    /// Pass content through untouched, contributing no metadata
    pub fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            metadata: None,
        }
    }

    pub fn new(content: String) -> Self {
        Self {
            content,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Capability interface implemented by every plugin
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Rewrite rendered content; called for every request in registration order
    async fn transform(&self, content: &str, _context: &PluginContext) -> anyhow::Result<Transformed> {
        Ok(Transformed::unchanged(content))
    }

    /// Extend the template context; each plugin's output feeds the next one
    async fn extend_template(&self, context: TemplateContext) -> anyhow::Result<TemplateContext> {
        Ok(context)
    }
}

/// Route / content-type filter shared by the built-in plugins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eligibility {
    /// Route prefixes, with a leading slash
    pub routes: Vec<String>,
    pub content_types: Vec<String>,
}

impl Eligibility {
    /// True if the content type is listed or the route starts with a listed prefix
    pub fn applies(&self, content_type: &str, route: &str) -> bool {
        self.content_types.iter().any(|t| t == content_type)
            || self.routes.iter().any(|r| route.starts_with(r.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Plugin for Noop {
        fn name(&self) -> &str {
            "noop"
        }
    }

    fn context() -> PluginContext {
        PluginContext {
            content_type: "page".into(),
            route: "/about".into(),
            template_dir: "templates".into(),
            content_sources: IndexMap::new(),
            site_url: "http://localhost:8000".into(),
            source_path: "content/about.md".into(),
        }
    }

    #[tokio::test]
    async fn test_default_hooks_are_noops() {
        let plugin = Noop;
        let out = plugin.transform("<p>x</p>", &context()).await.unwrap();
        assert_eq!(out, Transformed::unchanged("<p>x</p>"));

        let ctx = TemplateContext::new("c".into(), Metadata::new(), "/about");
        assert_eq!(plugin.extend_template(ctx.clone()).await.unwrap(), ctx);
    }

    #[test]
    fn test_eligibility() {
        let filter = Eligibility {
            routes: vec!["/docs".into()],
            content_types: vec!["blog".into()],
        };
        assert!(filter.applies("blog", "/blog/hello"));
        assert!(filter.applies("page", "/docs/intro"));
        assert!(!filter.applies("page", "/about"));
        assert!(!Eligibility::default().applies("blog", "/"));
    }
}
