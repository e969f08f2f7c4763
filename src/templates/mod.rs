//! Template module - Tera-backed engine with layouts, partials and a compiled-template cache

mod cache;
mod context;
mod engine;
mod filters;

pub use cache::{CacheStats, CompiledTemplate, TemplateCache};
pub use context::TemplateContext;
pub use engine::TemplateEngine;
