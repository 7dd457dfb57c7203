use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::sync::Arc;

use crate::app_state::AppState;
use crate::enrollment::Rejection;
use crate::i18n::{Localizer, SupportedLanguage};

/// Extractor for getting localized messages in handlers
pub struct I18n {
    pub localizer: Arc<Localizer>,
    pub language: SupportedLanguage,
}

impl I18n {
    pub fn get(&self, key: &str) -> String {
        self.localizer.get_string_for_language(&self.language, key)
    }

    /// The user-facing text of a rejection in the request language
    pub fn rejection(&self, rejection: &Rejection) -> String {
        self.get(&rejection.message_key())
    }
}

impl FromRequestParts<AppState> for I18n {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Set by the language middleware
        let language = parts
            .extensions
            .get::<SupportedLanguage>()
            .copied()
            .unwrap_or_default();

        Ok(I18n {
            localizer: state.localizer.clone(),
            language,
        })
    }
}
