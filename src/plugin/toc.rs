//! Table of contents generated from rendered headings

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;

use super::{Eligibility, Plugin, PluginContext, Transformed};
use crate::content::{MetaValue, Metadata};

lazy_static! {
    static ref HEADING: Regex =
        Regex::new(r#"<h([1-6])(?:\s+id="([^"]*)")?>([^<]+)</h[1-6]>"#).expect("valid heading regex");
}

/// Options for [`TableOfContentsPlugin`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TocOptions {
    #[serde(flatten)]
    pub filter: Eligibility,
    pub min_depth: u8,
    pub max_depth: u8,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            filter: Eligibility::default(),
            min_depth: 1,
            max_depth: 6,
        }
    }
}

#[derive(Debug)]
struct TocItem {
    level: u8,
    text: String,
    slug: String,
}

/// Prepends a linked list of headings and gives each listed heading an `id`
pub struct TableOfContentsPlugin {
    options: TocOptions,
}

impl TableOfContentsPlugin {
    pub const NAME: &'static str = "table_of_contents";

    pub fn new(options: TocOptions) -> Self {
        tracing::debug!("TableOfContentsPlugin initialized with {:?}", options);
        Self { options }
    }

    fn in_range(&self, level: u8) -> bool {
        (self.options.min_depth..=self.options.max_depth).contains(&level)
    }

    /// Add ids to in-range headings and collect them
    fn collect(&self, content: &str) -> (String, Vec<TocItem>) {
        let mut items = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        let content = HEADING.replace_all(content, |caps: &Captures| {
            let whole = caps[0].to_string();
            let level: u8 = caps[1].parse().unwrap_or(0);
            if !self.in_range(level) {
                return whole;
            }

            let text = caps[3].to_string();
            let slug = match caps.get(2) {
                Some(id) => id.as_str().to_string(),
                None => unique_slug(&text, &mut seen),
            };
            let heading = if caps.get(2).is_some() {
                whole
            } else {
                format!(r#"<h{level} id="{slug}">{text}</h{level}>"#)
            };
            items.push(TocItem { level, text, slug });
            heading
        });

        (content.into_owned(), items)
    }

    fn render_list(&self, items: &[TocItem]) -> String {
        let mut html =
            String::from("<div class=\"table-of-contents\">\n<h2>Table of Contents</h2>\n<ul>\n");
        for item in items {
            let indent = "  ".repeat(usize::from(item.level.saturating_sub(self.options.min_depth)));
            html.push_str(&format!(
                "{indent}<li><a href=\"#{}\">{}</a></li>\n",
                item.slug, item.text
            ));
        }
        html.push_str("</ul>\n</div>\n");
        html
    }
}

#[async_trait]
impl Plugin for TableOfContentsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn transform(&self, content: &str, context: &PluginContext) -> anyhow::Result<Transformed> {
        if !self.options.filter.applies(&context.content_type, &context.route) {
            tracing::debug!("Skipping TOC for {} {}", context.content_type, context.route);
            return Ok(Transformed::unchanged(content));
        }

        let (mut content, items) = self.collect(content);
        if !items.is_empty() {
            content.insert_str(0, &self.render_list(&items));
        }
        tracing::debug!("Generated TOC with {} items for {}", items.len(), context.route);

        let mut metadata = Metadata::new();
        metadata.insert("toc_generated".into(), MetaValue::from(!items.is_empty()));
        metadata.insert("toc_item_count".into(), MetaValue::from(items.len()));
        Ok(Transformed::new(content).with_metadata(metadata))
    }
}

/// Slug for `text`, suffixed with `-N` when already used on the page
fn unique_slug(text: &str, seen: &mut HashMap<String, usize>) -> String {
    let mut base = slug::slugify(text);
    if base.is_empty() {
        base = "section".to_string();
    }
    let count = seen.entry(base.clone()).or_insert(0);
    let slug = if *count == 0 {
        base
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn context(content_type: &str, route: &str) -> PluginContext {
        PluginContext {
            content_type: content_type.into(),
            route: route.into(),
            template_dir: "templates".into(),
            content_sources: IndexMap::new(),
            site_url: "http://localhost:8000".into(),
            source_path: "content/x.md".into(),
        }
    }

    fn plugin(min: u8, max: u8) -> TableOfContentsPlugin {
        TableOfContentsPlugin::new(TocOptions {
            filter: Eligibility {
                routes: vec!["/docs".into()],
                content_types: vec![],
            },
            min_depth: min,
            max_depth: max,
        })
    }

    #[tokio::test]
    async fn test_generates_toc_entry_and_id() {
        let out = plugin(2, 4)
            .transform("<h2>Intro</h2>\n<p>x</p>\n", &context("page", "/docs/guide"))
            .await
            .unwrap();
        assert_eq!(out.content.matches(r##"<li><a href="#intro">Intro</a></li>"##).count(), 1);
        assert!(out.content.contains(r#"<h2 id="intro">Intro</h2>"#));
        assert!(out.content.starts_with("<div class=\"table-of-contents\">"));

        let meta = out.metadata.unwrap();
        assert_eq!(meta["toc_generated"], MetaValue::Bool(true));
        assert_eq!(meta["toc_item_count"], MetaValue::Integer(1));
    }

    #[tokio::test]
    async fn test_out_of_range_headings_untouched() {
        let html = "<h1>Title</h1>\n<h2>Intro</h2>\n<h5>Deep</h5>\n";
        let out = plugin(2, 4)
            .transform(html, &context("page", "/docs"))
            .await
            .unwrap();
        assert!(out.content.contains("<h1>Title</h1>"));
        assert!(out.content.contains("<h5>Deep</h5>"));
        assert!(!out.content.contains("href=\"#title\""));
        assert!(!out.content.contains("href=\"#deep\""));
        assert_eq!(out.metadata.unwrap()["toc_item_count"], MetaValue::Integer(1));
    }

    #[tokio::test]
    async fn test_existing_ids_and_duplicates() {
        let html = "<h2 id=\"custom\">Setup</h2><h3>Step</h3><h3>Step</h3>";
        let out = plugin(2, 4)
            .transform(html, &context("page", "/docs"))
            .await
            .unwrap();
        assert!(out.content.contains("<h2 id=\"custom\">Setup</h2>"));
        assert!(out.content.contains("  <li><a href=\"#step\">Step</a></li>"));
        assert!(out.content.contains("<h3 id=\"step-1\">Step</h3>"));
        assert!(out.content.contains("<li><a href=\"#custom\">Setup</a></li>"));
    }

    #[tokio::test]
    async fn test_not_applicable_is_noop() {
        let html = "<h2>Intro</h2>";
        let out = plugin(1, 6)
            .transform(html, &context("page", "/about"))
            .await
            .unwrap();
        assert_eq!(out, Transformed::unchanged(html));
    }

    #[tokio::test]
    async fn test_no_headings() {
        let out = plugin(1, 6)
            .transform("<p>plain</p>", &context("page", "/docs"))
            .await
            .unwrap();
        assert_eq!(out.content, "<p>plain</p>");
        assert_eq!(out.metadata.unwrap()["toc_generated"], MetaValue::Bool(false));
    }

    #[test]
    fn test_options_from_json() {
        let options: TocOptions = serde_json::from_value(serde_json::json!({
            "routes": ["/plugin-example"],
            "min_depth": 2,
            "max_depth": 4
        }))
        .unwrap();
        assert_eq!(options.filter.routes, vec!["/plugin-example"]);
        assert_eq!(options.min_depth, 2);
        assert!(options.filter.content_types.is_empty());
    }
}
