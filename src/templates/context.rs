//! Template rendering context

use serde::Serialize;
use serde_json::{Map, Value};

use crate::content::Metadata;

/// Keys the pipeline owns; extensions cannot shadow them
const RESERVED_KEYS: [&str; 4] = ["content", "metadata", "route", "body"];

/// Data bag handed to the template engine for one render
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateContext {
    /// HTML body after plugin transforms
    pub content: String,
    /// Merged front-matter and plugin metadata
    pub metadata: Metadata,
    /// Request path with a leading slash
    pub route: String,
    /// Plugin-contributed fields
    #[serde(flatten)]
    extensions: Map<String, Value>,
}

impl TemplateContext {
    /// Create a new context
    pub fn new(content: String, metadata: Metadata, route: &str) -> Self {
        Self {
            content,
            metadata,
            route: route.to_string(),
            extensions: Map::new(),
        }
    }

    /// Add an extension field, returning `false` if the key is reserved
    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) -> bool {
        if RESERVED_KEYS.contains(&key) {
            tracing::warn!("Ignoring template extension with reserved key '{}'", key);
            return false;
        }
        self.extensions.insert(key.to_string(), value.into());
        true
    }

    /// Add an extension field from any serializable value
    pub fn insert_serialized<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.insert(key, value),
            Err(e) => {
                tracing::warn!("Failed to serialize template extension '{}': {}", key, e);
                false
            }
        }
    }

    /// Get an extension field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Convert to a Tera context; pipeline-owned keys win over extensions
    pub fn to_tera(&self) -> tera::Context {
        let mut ctx = tera::Context::new();
        for (key, value) in &self.extensions {
            ctx.insert(key.as_str(), value);
        }
        ctx.insert("content", &self.content);
        ctx.insert("metadata", &self.metadata);
        ctx.insert("route", &self.route);
        ctx
    }
}
