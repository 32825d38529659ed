//! Access to the current [`Session`].

use itertools::Itertools as _;
use service::{
    command::{AuthorizeUserSession, Command as _},
    domain::user::Session,
};
use tracing as log;

use crate::{cookie, Service};

/// Resolves the [`Session`] carried by the provided raw `Cookie` header.
///
/// [`None`] is returned if the session cookie is absent, or its token doesn't
/// pass the verification.
pub async fn from_cookie_header(service: &Service, raw: &str) -> Option<Session> {
    let Some(token) = cookie::parse(raw) else {
        log::debug!("no session cookie");
        return None;
    };

    service
        .execute(AuthorizeUserSession { token })
        .await
        .map_err(|e| log::debug!("session token rejected: {e}"))
        .ok()
}

/// Resolves the [`Session`] carried by the `Cookie` headers of a request.
pub async fn from_headers(
    service: &Service,
    headers: &http::HeaderMap,
) -> Option<Session> {
    let raw = headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .join("; ");
    from_cookie_header(service, &raw).await
}
