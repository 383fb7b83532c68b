//! Admin principal check.
//!
//! Authentication happens upstream. The auth proxy forwards the verified
//! principal in `x-admin-principal`; requests without it never reach an
//! admin handler.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::error::AppError;

pub const PRINCIPAL_HEADER: &str = "x-admin-principal";

/// Verified administrator forwarded by the auth proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal(pub String);

fn principal_from(headers: &HeaderMap) -> Option<AdminPrincipal> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| AdminPrincipal(value.to_string()))
}

/// Reject admin requests that arrive without a principal
pub async fn require_admin(mut request: Request, next: Next) -> Result<Response, AppError> {
    let principal = principal_from(request.headers())
        .ok_or_else(|| AppError::unauthorized("Admin authentication required"))?;

    debug!(
        admin = %principal.0,
        method = %request.method(),
        path = %request.uri().path(),
        "Admin request"
    );
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_principal_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(principal_from(&headers), None);

        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(principal_from(&headers), None);

        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("admin@example.com"));
        assert_eq!(
            principal_from(&headers),
            Some(AdminPrincipal("admin@example.com".to_string()))
        );
    }
}
