//! Content module - front-matter, metadata and Markdown processing

mod frontmatter;
mod markdown;
mod metadata;
mod processor;

pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use metadata::{merge_metadata, MetaValue, Metadata};
pub use processor::{MarkdownProcessor, ProcessedContent};
