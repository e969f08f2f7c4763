//! Site configuration (simpl.yml / simpl.toml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SiteError;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub site_url: String,
    pub site_title: String,

    // Content
    /// Ordered most-specific-first; the first matching route wins
    pub content_sources: Vec<ContentSource>,
    pub default_content_type: String,

    // Directories
    pub template_dir: PathBuf,
    pub assets_dir: PathBuf,

    // Plugins, in execution order
    pub plugins: Vec<PluginConfig>,
    pub plugin_failure: FailurePolicy,

    // Rendering
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Append error messages to 4xx/5xx bodies (development only)
    pub show_error_details: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:8000".to_string(),
            site_title: "Simpl Site".to_string(),

            content_sources: Vec::new(),
            default_content_type: "page".to_string(),

            template_dir: PathBuf::from("templates"),
            assets_dir: PathBuf::from("assets"),

            plugins: Vec::new(),
            plugin_failure: FailurePolicy::default(),

            templates: TemplateConfig::default(),
            markdown: MarkdownConfig::default(),

            show_error_details: false,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML or TOML file, rebasing relative paths on its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let config: SiteConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = config.rebase(base_dir);
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Resolve every relative directory against `base_dir`
    pub fn rebase<P: AsRef<Path>>(mut self, base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        let rebase = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };

        self.template_dir = rebase(&self.template_dir);
        self.assets_dir = rebase(&self.assets_dir);
        for source in &mut self.content_sources {
            source.path = rebase(&source.path);
        }
        self
    }

    /// Check invariants that would otherwise only surface per request
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.content_sources.is_empty() {
            return Err(SiteError::Config(
                "at least one content source is required".to_string(),
            ));
        }
        if self.source_for_type(&self.default_content_type).is_none() {
            return Err(SiteError::Config(format!(
                "default content type '{}' has no content source",
                self.default_content_type
            )));
        }
        Ok(())
    }

    /// First content source declared for a content type
    pub fn source_for_type(&self, content_type: &str) -> Option<&ContentSource> {
        self.content_sources
            .iter()
            .find(|source| source.content_type == content_type)
    }
}

/// Directory + type + route prefix describing one class of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Prefix matched against the request path without its leading slash
    #[serde(default)]
    pub route: String,
}

impl ContentSource {
    pub fn new(path: impl Into<PathBuf>, content_type: &str, route: &str) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.to_string(),
            route: route.to_string(),
        }
    }
}

/// Declarative plugin entry, resolved through a `PluginRegistry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl PluginConfig {
    pub fn new(name: &str, options: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

/// What to do when a plugin hook (or plugin construction) fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, discard that plugin's output and continue
    #[default]
    Skip,
    /// Log the failure and fail the request
    Abort,
}

/// Template engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub extension: String,
    pub layouts_dir: String,
    pub partials_dir: String,
    pub default_layout: String,
    /// Memoize compiled templates
    pub cache: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            extension: ".html".to_string(),
            layouts_dir: "layouts".to_string(),
            partials_dir: "partials".to_string(),
            default_layout: "base".to_string(),
            cache: true,
        }
    }
}

/// Markdown rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Highlight fenced code blocks with syntect
    pub highlight: bool,
    pub highlight_theme: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            highlight: false,
            highlight_theme: "base16-ocean.dark".to_string(),
        }
    }
}
