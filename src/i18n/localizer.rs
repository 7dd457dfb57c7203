use anyhow::{anyhow, Result};
use fluent_bundle::{FluentArgs, FluentValue};
use std::collections::HashMap;

use crate::i18n::fluent_loader::FluentLoader;
use crate::i18n::language::SupportedLanguage;

/// Main localization interface
pub struct Localizer {
    loader: FluentLoader,
    default_language: SupportedLanguage,
}

impl Localizer {
    pub fn new(loader: FluentLoader) -> Self {
        Self {
            loader,
            default_language: SupportedLanguage::default(),
        }
    }

    /// Get a localized message for a specific language, falling back to the default bundle
    pub fn get_message_with_language(
        &self,
        language: &SupportedLanguage,
        key: &str,
        args: Option<&HashMap<String, FluentValue>>,
    ) -> Result<String> {
        let bundle = self
            .loader
            .get_bundle(language)
            .filter(|bundle| bundle.has_message(key))
            .or_else(|| self.loader.get_bundle(&self.default_language))
            .ok_or_else(|| anyhow!("No bundle available for language: {}", language))?;

        let message = bundle
            .get_message(key)
            .ok_or_else(|| anyhow!("Message not found: {}", key))?;

        let pattern = message
            .value()
            .ok_or_else(|| anyhow!("Message has no value: {}", key))?;

        let mut errors = Vec::new();
        let formatted = match args {
            Some(args) => {
                let mut fluent_args = FluentArgs::new();
                for (k, v) in args {
                    fluent_args.set(k.as_str(), v.clone());
                }
                bundle.format_pattern(pattern, Some(&fluent_args), &mut errors)
            }
            None => bundle.format_pattern(pattern, None, &mut errors),
        };

        if !errors.is_empty() {
            tracing::warn!("Fluent formatting errors for key '{}': {:?}", key, errors);
        }

        Ok(formatted.into_owned())
    }

    /// Message text, or the key itself when it cannot be resolved
    pub fn get_string_for_language(&self, language: &SupportedLanguage, key: &str) -> String {
        self.get_message_with_language(language, key, None)
            .unwrap_or_else(|_| key.to_string())
    }

    pub fn get_string_with_args_for_language(
        &self,
        language: &SupportedLanguage,
        key: &str,
        args: &HashMap<String, FluentValue>,
    ) -> String {
        self.get_message_with_language(language, key, Some(args))
            .unwrap_or_else(|_| key.to_string())
    }

    pub fn has_message(&self, language: &SupportedLanguage, key: &str) -> bool {
        self.loader
            .get_bundle(language)
            .map(|bundle| bundle.has_message(key))
            .unwrap_or(false)
    }

    pub fn default_language(&self) -> SupportedLanguage {
        self.default_language
    }
}

/// Helper macro for creating FluentValue arguments
#[macro_export]
macro_rules! fluent_args {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut args = std::collections::HashMap::new();
        $(
            args.insert($key.to_string(), fluent_bundle::FluentValue::from($value));
        )*
        args
    }};
}
