//! Prepends the content file's modification date

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt::Write;

use super::{Eligibility, Plugin, PluginContext, Transformed};
use crate::content::{MetaValue, Metadata};

/// Options for [`LastModifiedPlugin`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LastModifiedOptions {
    #[serde(flatten)]
    pub filter: Eligibility,
    /// strftime pattern, applied in UTC
    pub date_format: String,
}

impl Default for LastModifiedOptions {
    fn default() -> Self {
        Self {
            filter: Eligibility::default(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

pub struct LastModifiedPlugin {
    options: LastModifiedOptions,
}

impl LastModifiedPlugin {
    pub const NAME: &'static str = "last_modified";

    pub fn new(options: LastModifiedOptions) -> Self {
        tracing::debug!("LastModifiedPlugin initialized with {:?}", options);
        Self { options }
    }
}

#[async_trait]
impl Plugin for LastModifiedPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn transform(&self, content: &str, context: &PluginContext) -> anyhow::Result<Transformed> {
        if !self.options.filter.applies(&context.content_type, &context.route) {
            return Ok(Transformed::unchanged(content));
        }

        let modified = match tokio::fs::metadata(&context.source_path)
            .await
            .and_then(|m| m.modified())
        {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(
                    "Could not read modification time of {:?}: {}",
                    context.source_path,
                    e
                );
                return Ok(Transformed::unchanged(content));
            }
        };

        let mut date = String::new();
        write!(
            date,
            "{}",
            DateTime::<Utc>::from(modified).format(&self.options.date_format)
        )
        .map_err(|_| anyhow::anyhow!("invalid date_format '{}'", self.options.date_format))?;
        tracing::debug!("Applied LastModifiedPlugin to {}", context.route);

        let mut metadata = Metadata::new();
        metadata.insert("last_modified".into(), MetaValue::from(date.as_str()));
        Ok(Transformed::new(format!(
            "<p class=\"last-modified\">Last modified: {}</p>\n{}",
            date, content
        ))
        .with_metadata(metadata))
    }
}
