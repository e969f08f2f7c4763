//! Ordered execution of plugin hooks

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use super::registry::PluginRegistry;
use super::{Plugin, PluginContext};
use crate::config::{FailurePolicy, SiteConfig};
use crate::content::{merge_metadata, ProcessedContent};
use crate::error::{Result, SiteError};
use crate::templates::TemplateContext;

/// Plugins in registration order, plus the site facts every hook sees
pub struct PluginPipeline {
    plugins: Vec<Box<dyn Plugin>>,
    policy: FailurePolicy,
    template_dir: PathBuf,
    content_sources: IndexMap<String, PathBuf>,
    site_url: String,
}

impl PluginPipeline {
    /// Resolve every configured plugin through `registry`
    ///
    /// Plugins that are unknown or fail to construct are dropped with a
    /// warning under [`FailurePolicy::Skip`] and abort construction otherwise.
    pub fn from_config(config: &SiteConfig, registry: &PluginRegistry) -> Result<Self> {
        let mut plugins = Vec::with_capacity(config.plugins.len());
        for plugin_config in &config.plugins {
            match registry.create(plugin_config) {
                Ok(plugin) => {
                    tracing::debug!("Loaded plugin '{}'", plugin_config.name);
                    plugins.push(plugin);
                }
                Err(e) if config.plugin_failure == FailurePolicy::Skip => {
                    tracing::warn!("Skipping plugin '{}': {}", plugin_config.name, e);
                }
                Err(e) => {
                    tracing::error!("Failed to load plugin '{}': {}", plugin_config.name, e);
                    return Err(e);
                }
            }
        }
        Ok(Self::with_plugins(config, plugins))
    }

    /// Build a pipeline from already constructed plugins
    pub fn with_plugins(config: &SiteConfig, plugins: Vec<Box<dyn Plugin>>) -> Self {
        let mut content_sources = IndexMap::new();
        for source in &config.content_sources {
            content_sources
                .entry(source.content_type.clone())
                .or_insert_with(|| source.path.clone());
        }
        Self {
            plugins,
            policy: config.plugin_failure,
            template_dir: config.template_dir.clone(),
            content_sources,
            site_url: config.site_url.clone(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Snapshot handed to every `transform` hook of one request
    pub fn context(&self, content_type: &str, route: &str, source_path: &Path) -> PluginContext {
        PluginContext {
            content_type: content_type.to_string(),
            route: route.to_string(),
            template_dir: self.template_dir.clone(),
            content_sources: self.content_sources.clone(),
            site_url: self.site_url.clone(),
            source_path: source_path.to_path_buf(),
        }
    }

    /// Run every `transform` hook in order
    ///
    /// Each plugin sees the previous plugin's content; returned metadata is
    /// merged over the accumulated metadata, so later plugins win per key.
    pub async fn transform(
        &self,
        mut processed: ProcessedContent,
        context: &PluginContext,
    ) -> Result<ProcessedContent> {
        for plugin in &self.plugins {
            match plugin.transform(&processed.content, context).await {
                Ok(out) => {
                    tracing::debug!("Plugin '{}' transformed {}", plugin.name(), context.route);
                    processed.content = out.content;
                    if let Some(metadata) = out.metadata {
                        merge_metadata(&mut processed.metadata, metadata);
                    }
                }
                Err(e) => self.fail(plugin.name(), "transform", &context.route, e)?,
            }
        }
        Ok(processed)
    }

    /// Thread the template context through every `extend_template` hook
    pub async fn extend_template(&self, mut context: TemplateContext) -> Result<TemplateContext> {
        for plugin in &self.plugins {
            let snapshot = context.clone();
            context = match plugin.extend_template(context).await {
                Ok(extended) => extended,
                Err(e) => {
                    self.fail(plugin.name(), "extend_template", &snapshot.route, e)?;
                    snapshot
                }
            };
        }
        Ok(context)
    }

    /// Log a hook failure; only returns `Ok` when the policy is to skip
    fn fail(&self, plugin: &str, hook: &str, route: &str, source: anyhow::Error) -> Result<()> {
        match self.policy {
            FailurePolicy::Skip => {
                tracing::warn!(
                    "Plugin '{}' {} failed for {}, skipping: {:#}",
                    plugin,
                    hook,
                    route,
                    source
                );
                Ok(())
            }
            FailurePolicy::Abort => {
                tracing::error!("Plugin '{}' {} failed for {}: {:#}", plugin, hook, route, source);
                Err(SiteError::PluginFailure {
                    plugin: plugin.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentSource, PluginConfig};
    use crate::content::{MetaValue, Metadata};
    use crate::plugin::Transformed;
    use async_trait::async_trait;
    use serde_json::Value;

    /// Appends a marker and contributes fixed metadata
    struct Tag {
        name: &'static str,
        metadata: Vec<(&'static str, i64)>,
    }

    #[async_trait]
    impl Plugin for Tag {
        fn name(&self) -> &str {
            self.name
        }

        async fn transform(&self, content: &str, _context: &PluginContext) -> anyhow::Result<Transformed> {
            let mut metadata = Metadata::new();
            for (key, value) in &self.metadata {
                metadata.insert(key.to_string(), MetaValue::from(*value));
            }
            Ok(Transformed::new(format!("{}[{}]", content, self.name)).with_metadata(metadata))
        }

        async fn extend_template(&self, mut context: TemplateContext) -> anyhow::Result<TemplateContext> {
            let seen = context
                .get("seen")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            context.insert("seen", format!("{}{}", seen, self.name));
            Ok(context)
        }
    }

    struct Broken;

    #[async_trait]
    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn transform(&self, _content: &str, _context: &PluginContext) -> anyhow::Result<Transformed> {
            anyhow::bail!("boom")
        }

        async fn extend_template(&self, mut context: TemplateContext) -> anyhow::Result<TemplateContext> {
            context.insert("partial", true);
            anyhow::bail!("boom")
        }
    }

    fn config(policy: FailurePolicy) -> SiteConfig {
        SiteConfig {
            content_sources: vec![
                ContentSource::new("content/blog", "blog", "blog/"),
                ContentSource::new("content/pages", "page", ""),
            ],
            plugin_failure: policy,
            ..SiteConfig::default()
        }
    }

    fn tag(name: &'static str, metadata: Vec<(&'static str, i64)>) -> Box<dyn Plugin> {
        Box::new(Tag { name, metadata })
    }

    fn processed(metadata: Vec<(&str, i64)>) -> ProcessedContent {
        ProcessedContent {
            metadata: metadata
                .into_iter()
                .map(|(k, v)| (k.to_string(), MetaValue::from(v)))
                .collect(),
            content: "<p>x</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_later_plugins_win_metadata() {
        let config = config(FailurePolicy::Skip);
        let pipeline = PluginPipeline::with_plugins(
            &config,
            vec![tag("p1", vec![("a", 1)]), tag("p2", vec![("a", 2), ("b", 3)])],
        );
        let ctx = pipeline.context("page", "/about", Path::new("content/pages/about.md"));

        let out = pipeline.transform(processed(vec![("a", 0)]), &ctx).await.unwrap();
        assert_eq!(out.metadata["a"], MetaValue::Integer(2));
        assert_eq!(out.metadata["b"], MetaValue::Integer(3));
        assert_eq!(out.metadata.len(), 2);
        assert_eq!(out.content, "<p>x</p>[p1][p2]");
    }

    #[tokio::test]
    async fn test_skip_policy_discards_failed_output() {
        let config = config(FailurePolicy::Skip);
        let pipeline = PluginPipeline::with_plugins(
            &config,
            vec![tag("p1", vec![]), Box::new(Broken), tag("p2", vec![])],
        );
        let ctx = pipeline.context("page", "/about", Path::new("about.md"));

        let out = pipeline.transform(processed(vec![]), &ctx).await.unwrap();
        assert_eq!(out.content, "<p>x</p>[p1][p2]");

        let tctx = TemplateContext::new(String::new(), Metadata::new(), "/about");
        let extended = pipeline.extend_template(tctx).await.unwrap();
        assert_eq!(extended.get("seen").unwrap(), "p1p2");
        assert!(extended.get("partial").is_none());
    }

    #[tokio::test]
    async fn test_abort_policy_fails_request() {
        let config = config(FailurePolicy::Abort);
        let pipeline =
            PluginPipeline::with_plugins(&config, vec![tag("p1", vec![]), Box::new(Broken)]);
        let ctx = pipeline.context("page", "/about", Path::new("about.md"));

        let err = pipeline.transform(processed(vec![]), &ctx).await.err().unwrap();
        assert!(matches!(err, SiteError::PluginFailure { ref plugin, .. } if plugin == "broken"));
        assert_eq!(err.status(), 500);

        let tctx = TemplateContext::new(String::new(), Metadata::new(), "/about");
        assert!(pipeline.extend_template(tctx).await.is_err());
    }

    #[tokio::test]
    async fn test_extend_template_chains_in_order() {
        let config = config(FailurePolicy::Skip);
        let pipeline = PluginPipeline::with_plugins(
            &config,
            vec![tag("a", vec![]), tag("b", vec![]), tag("c", vec![])],
        );
        let tctx = TemplateContext::new(String::new(), Metadata::new(), "/");
        let extended = pipeline.extend_template(tctx).await.unwrap();
        assert_eq!(extended.get("seen").unwrap(), "abc");
    }

    #[test]
    fn test_context_lists_sources() {
        let config = config(FailurePolicy::Skip);
        let pipeline = PluginPipeline::with_plugins(&config, vec![]);
        let ctx = pipeline.context("blog", "/blog/hello", Path::new("content/blog/hello.md"));
        assert_eq!(ctx.content_sources["blog"], PathBuf::from("content/blog"));
        assert_eq!(ctx.content_sources["page"], PathBuf::from("content/pages"));
        assert_eq!(ctx.site_url, "http://localhost:8000");
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_unknown_plugin_policy() {
        let registry = PluginRegistry::with_builtins();
        let mut skip = config(FailurePolicy::Skip);
        skip.plugins = vec![
            PluginConfig::new("Missing", Value::Null),
            PluginConfig::new("table_of_contents", Value::Null),
        ];
        let pipeline = PluginPipeline::from_config(&skip, &registry).unwrap();
        assert_eq!(pipeline.names(), vec!["table_of_contents"]);

        let abort = SiteConfig {
            plugin_failure: FailurePolicy::Abort,
            ..skip
        };
        assert!(matches!(
            PluginPipeline::from_config(&abort, &registry),
            Err(SiteError::UnknownPlugin(_))
        ));
    }
}
