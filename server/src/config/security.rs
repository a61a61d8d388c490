use axum::http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const XSS_BLOCK: &str = "1; mode=block";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=()";

fn security_headers(include_hsts: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF)),
        (X_FRAME_OPTIONS, HeaderValue::from_static(DENY)),
        (X_XSS_PROTECTION, HeaderValue::from_static(XSS_BLOCK)),
        (CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP_API_VALUE)),
        (REFERRER_POLICY, HeaderValue::from_static(REFERRER_POLICY_VALUE)),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static(PERMISSIONS_POLICY_VALUE),
        ),
    ];

    // HSTS only makes sense behind HTTPS.
    if include_hsts {
        headers.push((STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE)));
    }

    headers
}

/// Adds the API's hardening headers to every response of `router`.
pub fn with_security_headers<S>(router: Router<S>, include_hsts: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if include_hsts {
        tracing::info!("Security: HSTS header enabled (production mode)");
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
    }

    security_headers(include_hsts)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}
