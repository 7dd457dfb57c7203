use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::i18n::SupportedLanguage;

/// Stores the request language in the request extensions for the `I18n` extractor.
pub async fn language_middleware(mut request: Request, next: Next) -> Response {
    let language = detect_language_from_headers(request.headers());
    request.extensions_mut().insert(language);
    next.run(request).await
}

/// `X-Language` wins over `Accept-Language`; English otherwise.
fn detect_language_from_headers(headers: &HeaderMap) -> SupportedLanguage {
    if let Some(language) = headers
        .get("X-Language")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<SupportedLanguage>().ok())
    {
        return language;
    }

    headers
        .get("Accept-Language")
        .and_then(|value| value.to_str().ok())
        .map(SupportedLanguage::from_accept_language)
        .unwrap_or_default()
}
