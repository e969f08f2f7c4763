//! List site information

use anyhow::Result;

use crate::plugin::PluginRegistry;
use crate::SimplSite;

/// List site information by kind
pub async fn run(site: &SimplSite, registry: &PluginRegistry, kind: &str) -> Result<()> {
    match kind {
        "source" | "sources" => {
            let config = site.config();
            println!("Content sources ({}):", config.content_sources.len());
            for source in &config.content_sources {
                let marker = if source.content_type == config.default_content_type {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {}{} - /{} [{}]",
                    source.content_type,
                    marker,
                    source.route,
                    source.path.display()
                );
            }
        }
        "plugin" | "plugins" => {
            let active = site.plugin_names();
            println!("Active plugins ({}):", active.len());
            for name in &active {
                println!("  {}", name);
            }
            let available: Vec<&str> = registry
                .names()
                .into_iter()
                .filter(|name| !active.contains(name))
                .collect();
            if !available.is_empty() {
                println!("Available plugins ({}):", available.len());
                for name in available {
                    println!("  {}", name);
                }
            }
        }
        "template" | "templates" => {
            let templates = site.template_names().await?;
            println!("Templates ({}):", templates.len());
            for name in templates {
                let missing = site.config().source_for_type(&name).is_none();
                if missing {
                    println!("  {} (no content source)", name);
                } else {
                    println!("  {}", name);
                }
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: sources, plugins, templates",
                kind
            );
        }
    }

    Ok(())
}
