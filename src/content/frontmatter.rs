//! Front-matter parsing
//!
//! Front-matter is a block of `key: value` lines between two `---` delimiter
//! lines at the very top of a file. Values are kept as strings; there is no
//! YAML-style nesting, lists or type coercion.

use super::metadata::{MetaValue, Metadata};

const DELIMITER: &str = "---";

/// Front-matter block split from a content file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub metadata: Metadata,
}

impl FrontMatter {
    /// Split front-matter from content
    /// Returns (front_matter, body). Without a leading delimiter, or without a
    /// closing one, the metadata is empty and the body is the input unchanged.
    pub fn parse(content: &str) -> (Self, &str) {
        if !content.starts_with(DELIMITER) {
            return (FrontMatter::default(), content);
        }

        let mut lines = content.split_inclusive('\n');
        let first = lines.next().unwrap_or_default();
        if !is_delimiter(first) {
            return (FrontMatter::default(), content);
        }

        let mut offset = first.len();
        let block_start = offset;
        for line in lines {
            if is_delimiter(line) {
                let block = &content[block_start..offset];
                let body = content[offset + line.len()..].trim();
                return (Self::parse_block(block), body);
            }
            offset += line.len();
        }

        tracing::debug!("Front-matter has no closing delimiter, treating as body");
        (FrontMatter::default(), content)
    }

    fn parse_block(block: &str) -> Self {
        let mut metadata = Metadata::new();
        for line in block.lines() {
            // first colon splits key from value; lines without one are ignored
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            metadata.insert(key.to_string(), MetaValue::String(value.trim().to_string()));
        }
        Self { metadata }
    }

    /// Get a front-matter value as a string
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetaValue::as_str)
    }

    pub fn into_metadata(self) -> Metadata {
        self.metadata
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == DELIMITER
}
