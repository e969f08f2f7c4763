//! simpl-site: Markdown content rendered through plugins and layout templates
//!
//! A [`SimplSite`] turns a request path into a [`Response`]: static assets are
//! served verbatim, everything else is resolved to a Markdown file, run
//! through the plugin chain and rendered with Tera templates.

pub mod assets;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod plugin;
pub mod response;
pub mod router;
pub mod server;
pub mod templates;

use std::path::Path;
use std::sync::Arc;

use assets::StaticAssets;
use config::SiteConfig;
use content::MarkdownProcessor;
use error::{error_chain, Result, SiteError};
use plugin::{PluginPipeline, PluginRegistry};
use response::{status_text, Response, STATUS_INTERNAL_ERROR};
use router::{normalize_path, ResolvedRoute, Router};
use templates::{CacheStats, TemplateContext, TemplateEngine};

/// The site orchestrator; cheap to clone and shareable across tasks
#[derive(Clone)]
pub struct SimplSite {
    inner: Arc<SiteInner>,
}

struct SiteInner {
    config: SiteConfig,
    router: Router,
    assets: StaticAssets,
    processor: MarkdownProcessor,
    pipeline: PluginPipeline,
    engine: TemplateEngine,
}

impl SimplSite {
    /// Build a site, resolving configured plugins through `registry`
    pub async fn new(config: SiteConfig, registry: &PluginRegistry) -> Result<Self> {
        config.validate()?;

        let pipeline = PluginPipeline::from_config(&config, registry)?;
        let engine = TemplateEngine::new(&config.template_dir, config.templates.clone()).await?;
        tracing::info!(
            "Site '{}' ready: {} content sources, {} plugins",
            config.site_title,
            config.content_sources.len(),
            pipeline.len()
        );

        Ok(Self {
            inner: Arc::new(SiteInner {
                router: Router::from_config(&config),
                assets: StaticAssets::new(&config.assets_dir),
                processor: MarkdownProcessor::new(&config.markdown),
                pipeline,
                engine,
                config,
            }),
        })
    }

    /// Load `simpl.yml` / `simpl.toml` and build the site
    pub async fn from_config_file<P: AsRef<Path>>(
        path: P,
        registry: &PluginRegistry,
    ) -> anyhow::Result<Self> {
        let config = SiteConfig::load(path)?;
        Ok(Self::new(config, registry).await?)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Names of the active plugins, in execution order
    pub fn plugin_names(&self) -> Vec<&str> {
        self.inner.pipeline.names()
    }

    /// Template names available for content types
    pub async fn template_names(&self) -> Result<Vec<String>> {
        self.inner.engine.template_names().await
    }

    /// Handle one request path
    ///
    /// Never fails: errors become 4xx/5xx responses, and a panic while
    /// handling the request becomes a 500.
    pub async fn handle_request(&self, path: &str) -> Response {
        tracing::debug!("Handling request for path: {}", path);

        let site = self.clone();
        let owned = path.to_string();
        let outcome = tokio::spawn(async move { site.respond(&owned).await }).await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => self.error_response(path, e),
            Err(join_error) => {
                tracing::error!("Request {} aborted: {}", path, join_error);
                Response::error(
                    STATUS_INTERNAL_ERROR,
                    status_text(STATUS_INTERNAL_ERROR).to_string(),
                )
            }
        }
    }

    /// Render one content file through the plugin chain and its template
    ///
    /// `relative_path` is relative to the directory of `content_type`.
    pub async fn render_content(
        &self,
        relative_path: &str,
        content_type: &str,
        route: &str,
    ) -> Result<String> {
        let source_dir = self.inner.router.source_dir(content_type)?;
        let resolved = ResolvedRoute {
            content_type: content_type.to_string(),
            source_dir: source_dir.to_path_buf(),
            relative_path: relative_path.to_string(),
            route: route.to_string(),
        };
        self.render_resolved(&resolved).await
    }

    /// Drop every compiled template; the next render rereads from disk
    pub fn clear_cache(&self) {
        self.inner.engine.clear_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.engine.cache_stats()
    }

    async fn respond(&self, path: &str) -> Result<Response> {
        let path = normalize_path(path)?;

        if let Some(asset) = self.inner.assets.probe(&path).await? {
            tracing::debug!("Serving static file: {}", path);
            return Ok(asset);
        }

        let resolved = self.inner.router.resolve(&path)?;
        let html = self.render_resolved(&resolved).await?;
        Ok(Response::html(html))
    }

    async fn render_resolved(&self, resolved: &ResolvedRoute) -> Result<String> {
        let inner = &self.inner;
        let file = resolved.file_path();
        tracing::debug!(
            "Rendering content for path: {:?}, type: {}, route: {}",
            file,
            resolved.content_type,
            resolved.route
        );

        let raw = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| SiteError::content_io(file.clone(), e))?;
        let processed = inner.processor.execute(&raw);

        let plugin_context = inner
            .pipeline
            .context(&resolved.content_type, &resolved.route, &file);
        let processed = inner.pipeline.transform(processed, &plugin_context).await?;

        let context = TemplateContext::new(processed.content, processed.metadata, &resolved.route);
        let context = inner.pipeline.extend_template(context).await?;

        inner.engine.render(&resolved.content_type, &context).await
    }

    fn error_response(&self, path: &str, err: SiteError) -> Response {
        let status = err.status();
        let detail = error_chain(&err);
        if status >= STATUS_INTERNAL_ERROR {
            tracing::error!("Request {} failed: {}", path, detail);
        } else {
            tracing::debug!("Request {} -> {}: {}", path, status, detail);
        }

        let mut body = status_text(status).to_string();
        if self.inner.config.show_error_details {
            body.push_str(": ");
            body.push_str(&detail);
        }
        Response::error(status, body)
    }
}
