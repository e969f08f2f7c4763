//! Compiled-template cache
//!
//! Maps canonical template paths to compiled Tera instances. Each path owns a
//! once-cell, so concurrent first renders of the same file compile it once
//! while renders of other files proceed independently.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tera::Tera;
use tokio::sync::OnceCell;

use crate::error::{Result, SiteError};

/// An immutable, reusable compiled template
#[derive(Debug)]
pub struct CompiledTemplate {
    path: PathBuf,
    name: String,
    tera: Tera,
}

impl CompiledTemplate {
    /// Compile `source` on top of `base` (which carries partials and filters)
    pub fn compile(base: &Tera, path: &Path, source: &str) -> Result<Self> {
        let name = path.to_string_lossy().into_owned();
        let mut tera = base.clone();
        tera.add_raw_template(&name, source)
            .map_err(|source| SiteError::Template {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            name,
            tera,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self, context: &tera::Context) -> Result<String> {
        self.tera
            .render(&self.name, context)
            .map_err(|source| SiteError::Template {
                path: self.path.clone(),
                source,
            })
    }
}

type Slot = Arc<OnceCell<Arc<CompiledTemplate>>>;

/// Snapshot of the cache contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub templates: Vec<PathBuf>,
}

/// Memoization table for compiled templates
#[derive(Debug)]
pub struct TemplateCache {
    enabled: bool,
    slots: RwLock<HashMap<PathBuf, Slot>>,
}

impl TemplateCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached template for `path`, compiling it on first use
    pub async fn get_or_compile<F, Fut>(&self, path: &Path, compile: F) -> Result<Arc<CompiledTemplate>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CompiledTemplate>>,
    {
        if !self.enabled {
            return compile().await.map(Arc::new);
        }

        let slot = self.slot(path);
        if slot.initialized() {
            tracing::debug!("Using cached template: {:?}", path);
        }
        let template = slot
            .get_or_try_init(move || async move {
                tracing::debug!("Compiling template: {:?}", path);
                compile().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(template))
    }

    /// Drop every compiled template
    ///
    /// Lookups that start after this returns see an empty map and compile
    /// from disk again.
    pub fn clear(&self) {
        tracing::debug!("Clearing template cache");
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .is_some_and(|slot| slot.initialized())
    }

    pub fn stats(&self) -> CacheStats {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut templates: Vec<PathBuf> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(path, _)| path.clone())
            .collect();
        templates.sort();
        CacheStats {
            size: templates.len(),
            templates,
        }
    }

    fn slot(&self, path: &Path) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(path.to_path_buf()).or_default())
    }
}
