//! Raw content file -> metadata + HTML

use super::frontmatter::FrontMatter;
use super::markdown::MarkdownRenderer;
use super::metadata::Metadata;
use crate::config::MarkdownConfig;

/// Output of [`MarkdownProcessor::execute`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedContent {
    pub metadata: Metadata,
    /// Rendered HTML body
    pub content: String,
}

/// Splits front-matter from a content file and renders its body
#[derive(Default)]
pub struct MarkdownProcessor {
    renderer: MarkdownRenderer,
}

impl MarkdownProcessor {
    pub fn new(config: &MarkdownConfig) -> Self {
        Self {
            renderer: MarkdownRenderer::from_config(config),
        }
    }

    pub fn execute(&self, raw: &str) -> ProcessedContent {
        let (front_matter, body) = FrontMatter::parse(raw);
        ProcessedContent {
            metadata: front_matter.into_metadata(),
            content: self.renderer.render(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_execute_with_front_matter() {
        let processor = MarkdownProcessor::default();
        let out = processor.execute("---\ntitle: Hello\nauthor: Me\n---\n\n## Intro\n\nText.");
        assert_eq!(out.metadata["title"].as_str(), Some("Hello"));
        assert_eq!(out.metadata["author"].as_str(), Some("Me"));
        assert!(out.content.contains("<h2>Intro</h2>"));
        assert!(out.content.contains("<p>Text.</p>"));
    }

    #[test]
    fn test_execute_without_front_matter() {
        let processor = MarkdownProcessor::default();
        let out = processor.execute("plain *text*");
        assert!(out.metadata.is_empty());
        assert_eq!(out.content, "<p>plain <em>text</em></p>\n");
    }

    #[test]
    fn test_execute_is_shareable_across_threads() {
        let processor = Arc::new(MarkdownProcessor::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let processor = Arc::clone(&processor);
                std::thread::spawn(move || processor.execute(&format!("---\nn: {}\n---\n# H{}", i, i)))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let out = handle.join().unwrap();
            assert_eq!(out.metadata["n"].as_str(), Some(i.to_string().as_str()));
            assert!(out.content.contains(&format!("<h1>H{}</h1>", i)));
        }
    }
}
