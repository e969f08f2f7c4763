//! Layout-composing template engine on top of Tera

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::Tera;

use super::cache::{CacheStats, CompiledTemplate, TemplateCache};
use super::context::TemplateContext;
use super::filters;
use crate::config::TemplateConfig;
use crate::error::{Result, SiteError};

/// Renders page templates wrapped in the default layout
///
/// Directory conventions under `base_dir`:
/// - `<name><ext>`: page templates, one per content type
/// - `layouts/<default_layout><ext>`: optional layout; receives the page output as `body`
/// - `partials/*<ext>`: registered by file stem, usable via `{% include "stem" %}`
pub struct TemplateEngine {
    base_dir: PathBuf,
    config: TemplateConfig,
    /// Partials and filters; cloned into every compiled template
    base: Tera,
    partials: Vec<String>,
    cache: TemplateCache,
}

impl TemplateEngine {
    /// Create an engine and register every partial found under `partials/`
    pub async fn new<P: AsRef<Path>>(base_dir: P, config: TemplateConfig) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let mut base = Tera::default();
        // Content is already HTML; escaping would mangle it
        base.autoescape_on(vec![]);
        filters::register(&mut base);

        let partials_dir = base_dir.join(&config.partials_dir);
        let partials = load_partials(&partials_dir, &config.extension).await?;
        base.add_raw_templates(partials.iter().map(|(name, source)| (name.as_str(), source.as_str())))
            .map_err(|source| SiteError::Template {
                path: partials_dir.clone(),
                source,
            })?;
        let partials: Vec<String> = partials.into_iter().map(|(name, _)| name).collect();
        tracing::debug!("Registered {} partials from {:?}", partials.len(), partials_dir);

        Ok(Self {
            base_dir,
            cache: TemplateCache::new(config.cache),
            config,
            base,
            partials,
        })
    }

    /// Path of the page template for `name`
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}{}", name, self.config.extension))
    }

    /// Path of the default layout
    pub fn layout_path(&self) -> PathBuf {
        self.base_dir.join(&self.config.layouts_dir).join(format!(
            "{}{}",
            self.config.default_layout, self.config.extension
        ))
    }

    /// Render page template `name`, then wrap it in the default layout if one exists
    pub async fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        tracing::debug!("Rendering template: {}", name);
        let page_path = self.template_path(name);
        let page = self
            .compiled(&page_path)
            .await?
            .ok_or_else(|| SiteError::TemplateNotFound(page_path.clone()))?;

        let mut tera_context = context.to_tera();
        let body = page.render(&tera_context)?;

        match self.compiled(&self.layout_path()).await? {
            Some(layout) => {
                tera_context.insert("body", &body);
                layout.render(&tera_context)
            }
            None => Ok(body),
        }
    }

    /// Drop all compiled templates
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Names of registered partials
    pub fn partials(&self) -> &[String] {
        &self.partials
    }

    /// Page templates available at the root of the template directory
    pub async fn template_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = list_templates(&self.base_dir, &self.config.extension)
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Fetch a compiled template, `None` if the file does not exist
    async fn compiled(&self, path: &Path) -> Result<Option<Arc<CompiledTemplate>>> {
        let canonical = match tokio::fs::canonicalize(path).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SiteError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let template = self
            .cache
            .get_or_compile(&canonical, || async {
                let source = tokio::fs::read_to_string(&canonical)
                    .await
                    .map_err(|source| SiteError::Io {
                        path: canonical.clone(),
                        source,
                    })?;
                CompiledTemplate::compile(&self.base, &canonical, &source)
            })
            .await?;
        Ok(Some(template))
    }
}

/// Read all partials, keyed by file stem; a missing directory means no partials
async fn load_partials(dir: &Path, extension: &str) -> Result<Vec<(String, String)>> {
    let mut partials = Vec::new();
    for (name, path) in list_templates(dir, extension).await? {
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SiteError::Io { path, source })?;
        partials.push((name, source));
    }
    Ok(partials)
}

/// Template files directly inside `dir` as (stem, path) pairs
async fn list_templates(dir: &Path, extension: &str) -> Result<Vec<(String, PathBuf)>> {
    let io_err = |source: std::io::Error| SiteError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Template directory {:?} not found", dir);
            return Ok(Vec::new());
        }
        Err(e) => return Err(io_err(e)),
    };

    let mut templates = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        if !entry.file_type().await.map_err(io_err)?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = file_name.strip_suffix(extension) {
            if !stem.is_empty() {
                templates.push((stem.to_string(), entry.path()));
            }
        }
    }
    Ok(templates)
}
