use anyhow::{Context, Result};
use fluent_bundle::{concurrent::FluentBundle, FluentResource};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::i18n::language::SupportedLanguage;

pub type Bundle = FluentBundle<FluentResource>;

fn embedded_messages(language: SupportedLanguage) -> &'static str {
    match language {
        SupportedLanguage::English => include_str!("../../locales/en/messages.ftl"),
        SupportedLanguage::French => include_str!("../../locales/fr/messages.ftl"),
    }
}

/// Loads and manages Fluent translation resources
pub struct FluentLoader {
    bundles: HashMap<SupportedLanguage, Bundle>,
}

impl FluentLoader {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Builds the bundle for `language` from the embedded messages, then lets any
    /// `.ftl` file under `<overrides_dir>/<code>/` replace individual messages.
    pub fn load_locale(&mut self, language: SupportedLanguage, overrides_dir: Option<&Path>) -> Result<()> {
        let mut bundle = FluentBundle::new_concurrent(vec![language.lang_id()]);
        bundle.set_use_isolating(false);

        let embedded = parse_resource(embedded_messages(language).to_string(), language.code())?;
        bundle
            .add_resource(embedded)
            .map_err(|errors| anyhow::anyhow!("Failed to add embedded resource: {:?}", errors))?;

        let mut overrides = 0;
        if let Some(dir) = overrides_dir {
            let locale_dir = dir.join(language.code());
            if locale_dir.is_dir() {
                let entries = fs::read_dir(&locale_dir)
                    .with_context(|| format!("Failed to read locale directory: {:?}", locale_dir))?;
                for entry in entries {
                    let path = entry?.path();
                    if path.extension().and_then(|s| s.to_str()) != Some("ftl") {
                        continue;
                    }
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read file: {:?}", path))?;
                    let resource = parse_resource(content, &path.display().to_string())?;
                    bundle.add_resource_overriding(resource);
                    overrides += 1;
                }
            }
        }

        tracing::info!(
            locale = language.code(),
            overrides,
            "Loaded Fluent bundle"
        );

        self.bundles.insert(language, bundle);
        Ok(())
    }

    pub fn get_bundle(&self, language: &SupportedLanguage) -> Option<&Bundle> {
        self.bundles.get(language)
    }
}

impl Default for FluentLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_resource(content: String, origin: &str) -> Result<FluentResource> {
    FluentResource::try_new(content)
        .map_err(|(_, errors)| anyhow::anyhow!("Failed to parse FTL {}: {:?}", origin, errors))
}
