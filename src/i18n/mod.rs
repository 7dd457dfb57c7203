pub mod fluent_loader;
pub mod helpers;
pub mod language;
pub mod localizer;

pub use fluent_loader::FluentLoader;
pub use helpers::I18n;
pub use language::SupportedLanguage;
pub use localizer::Localizer;

use anyhow::Result;
use std::path::Path;
use time::macros::format_description;
use time::OffsetDateTime;

/// Initialize the i18n system with every supported locale
pub fn init_i18n(overrides_dir: Option<&Path>) -> Result<Localizer> {
    let mut loader = FluentLoader::new();
    for language in SupportedLanguage::all() {
        loader.load_locale(*language, overrides_dir)?;
    }
    Ok(Localizer::new(loader))
}

/// Renders a timestamp for message arguments, e.g. `2026-11-02 09:00 UTC`.
pub fn format_datetime(value: OffsetDateTime) -> String {
    let utc = value.to_offset(time::UtcOffset::UTC);
    utc.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .unwrap_or_else(|_| utc.to_string())
}
