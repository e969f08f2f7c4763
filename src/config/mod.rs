//! Configuration module

mod site;

pub use site::ContentSource;
pub use site::FailurePolicy;
pub use site::MarkdownConfig;
pub use site::PluginConfig;
pub use site::SiteConfig;
pub use site::TemplateConfig;
