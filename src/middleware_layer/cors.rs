use std::time::Duration;

use http::{
    HeaderName, HeaderValue, Method,
    header::{self, InvalidHeaderValue},
};
use tower_http::cors::CorsLayer;

use super::csrf::CSRF_HEADER;

/// CORS for the single trusted front-end origin.
///
/// Credentials are allowed so the session cookie travels, and the CSRF header
/// is both accepted and exposed. Every `OPTIONS` request is answered here as a
/// preflight without reaching the rest of the pipeline.
pub fn cors_layer(main_host: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = HeaderValue::from_str(main_host)?;
    let csrf_header = HeaderName::from_static(CSRF_HEADER);

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            csrf_header.clone(),
        ])
        .expose_headers([
            header::ACCEPT,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            csrf_header,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400)))
}
