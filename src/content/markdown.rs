//! Markdown rendering with optional syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::MarkdownConfig;

/// Syntax highlighter for fenced code blocks
struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

/// CommonMark renderer
///
/// Holds only immutable state, so one instance can be shared across
/// concurrent requests.
pub struct MarkdownRenderer {
    highlighter: Option<Highlighter>,
}

impl MarkdownRenderer {
    /// Create a plain CommonMark renderer
    pub fn new() -> Self {
        Self { highlighter: None }
    }

    /// Create from configuration, loading syntect assets only when highlighting is on
    pub fn from_config(config: &MarkdownConfig) -> Self {
        if config.highlight {
            Self::with_highlighting(&config.highlight_theme)
        } else {
            Self::new()
        }
    }

    /// Create with syntax highlighting using the named syntect theme
    pub fn with_highlighting(theme: &str) -> Self {
        Self {
            highlighter: Some(Highlighter {
                syntax_set: SyntaxSet::load_defaults_newlines(),
                theme_set: ThemeSet::load_defaults(),
                theme_name: theme.to_string(),
            }),
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        // Front-matter is split off beforehand, so no metadata block option here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        match &self.highlighter {
            None => html::push_html(&mut html_output, parser),
            Some(highlighter) => {
                let events = highlighter.highlight_events(parser);
                html::push_html(&mut html_output, events.into_iter())
            }
        }
        html_output
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Replace fenced code blocks that name a language with highlighted HTML
    fn highlight_events<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(String, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) if !lang.is_empty() => {
                    code_block = Some((lang.to_string(), String::new()));
                }
                Event::End(TagEnd::CodeBlock) if code_block.is_some() => {
                    if let Some((lang, code)) = code_block.take() {
                        events.push(Event::Html(CowStr::from(self.highlight_code(&code, &lang))));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                _ => events.push(event),
            }
        }

        events
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                lang, highlighted
            ),
            None => format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang,
                html_escape(code)
            ),
        }
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
