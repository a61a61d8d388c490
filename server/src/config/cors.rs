use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let parsed = parse_origins(origins);

    if parsed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, allowing any origin");
        AllowOrigin::any()
    } else {
        tracing::info!("CORS: Configured with {} allowed origin(s)", parsed.len());
        AllowOrigin::list(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{split_origins, DEFAULT_ALLOWED_ORIGINS};

    #[test]
    fn default_origins_are_valid_header_values() {
        let origins = split_origins(DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(parse_origins(&origins).len(), origins.len());
    }

    #[test]
    fn invalid_origins_are_dropped() {
        let origins = vec!["https://ok.dev".to_string(), "bad\norigin".to_string()];
        assert_eq!(parse_origins(&origins).len(), 1);
    }
}
