//! Name -> plugin factory registry
//!
//! The integrator fills a registry before constructing the site; plugin
//! configs are then resolved by name. There is no global registry, so several
//! sites with different registries can live in one process.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::last_modified::LastModifiedPlugin;
use super::toc::TableOfContentsPlugin;
use super::Plugin;
use crate::config::PluginConfig;
use crate::error::{Result, SiteError};

/// Builds a plugin from its raw options
pub type PluginFactory = Arc<dyn Fn(&Value) -> anyhow::Result<Box<dyn Plugin>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `table_of_contents` and `last_modified` plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_typed(TableOfContentsPlugin::NAME, TableOfContentsPlugin::new)
            .register_typed(LastModifiedPlugin::NAME, LastModifiedPlugin::new);
        registry
    }

    /// Register a factory over raw options; replaces any previous factory of that name
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Value) -> anyhow::Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(name.to_string(), Arc::new(factory))
            .is_some()
        {
            tracing::debug!("Replaced plugin factory '{}'", name);
        }
        self
    }

    /// Register a constructor taking typed options
    ///
    /// Missing options deserialize from an empty map, so option structs with
    /// `#[serde(default)]` work without configuration.
    pub fn register_typed<O, P, F>(&mut self, name: &str, ctor: F) -> &mut Self
    where
        O: DeserializeOwned,
        P: Plugin + 'static,
        F: Fn(O) -> P + Send + Sync + 'static,
    {
        self.register(name, move |options: &Value| {
            let options = match options {
                Value::Null => Value::Object(serde_json::Map::new()),
                other => other.clone(),
            };
            let options: O = serde_json::from_value(options)?;
            Ok(Box::new(ctor(options)) as Box<dyn Plugin>)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the plugin described by `config`
    pub fn create(&self, config: &PluginConfig) -> Result<Box<dyn Plugin>> {
        let factory = self
            .factories
            .get(&config.name)
            .ok_or_else(|| SiteError::UnknownPlugin(config.name.clone()))?;
        factory(&config.options).map_err(|source| SiteError::PluginFailure {
            plugin: config.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoOptions {
        label: String,
    }

    struct Echo {
        label: String,
    }

    #[async_trait::async_trait]
    impl Plugin for Echo {
        fn name(&self) -> &str {
            &self.label
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["last_modified", "table_of_contents"]);
    }

    #[test]
    fn test_create_typed_plugin() {
        let mut registry = PluginRegistry::new();
        registry.register_typed("echo", |o: EchoOptions| Echo { label: o.label });

        let plugin = registry
            .create(&PluginConfig::new("echo", json!({ "label": "hi" })))
            .unwrap();
        assert_eq!(plugin.name(), "hi");
    }

    #[test]
    fn test_unknown_plugin() {
        let registry = PluginRegistry::new();
        let err = registry
            .create(&PluginConfig::new("Missing", Value::Null))
            .err()
            .unwrap();
        assert!(matches!(err, SiteError::UnknownPlugin(name) if name == "Missing"));
    }

    #[test]
    fn test_bad_options_are_plugin_failure() {
        let mut registry = PluginRegistry::new();
        registry.register_typed("echo", |o: EchoOptions| Echo { label: o.label });
        let err = registry
            .create(&PluginConfig::new("echo", json!({ "label": 3 })))
            .err()
            .unwrap();
        assert!(matches!(err, SiteError::PluginFailure { plugin, .. } if plugin == "echo"));
    }

    #[test]
    fn test_null_options_use_defaults() {
        let registry = PluginRegistry::with_builtins();
        let plugin = registry
            .create(&PluginConfig::new("table_of_contents", Value::Null))
            .unwrap();
        assert_eq!(plugin.name(), "table_of_contents");
    }

    #[test]
    fn test_independent_registries() {
        let mut a = PluginRegistry::new();
        a.register_typed("echo", |o: EchoOptions| Echo { label: o.label });
        let b = PluginRegistry::new();
        assert!(a.contains("echo"));
        assert!(!b.contains("echo"));
    }
}
