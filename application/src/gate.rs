//! Gate protecting routes from the requests without a valid session.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use http::{header, HeaderValue, StatusCode};
#[cfg(doc)]
use service::domain::user::Session;
use service::domain::route::{Access, Routes};
use tracing as log;

use crate::{session, Context};

/// Header carrying the ID of the authenticated user.
pub const USER_ID: &str = "x-user-id";

/// Header carrying the login the user authenticated with.
pub const USER_LOGIN: &str = "x-user-login";

/// Header carrying the display name of the authenticated user.
pub const USER_NAME: &str = "x-user-name";

/// Middleware gating requests according to the [`Routes`] of the [`Context`].
///
/// Requests to protected routes without a valid session are redirected to
/// the login page. Otherwise, the identity of the [`Session`] is passed
/// downstream via headers and request extensions.
pub async fn gate(ctx: Context, mut req: Request, next: Next) -> Response {
    for name in [USER_ID, USER_LOGIN, USER_NAME] {
        drop(req.headers_mut().remove(name));
    }

    let path = req.uri().path();
    if Routes::is_asset(path) || ctx.routes().classify(path) == Access::Public
    {
        return next.run(req).await;
    }

    if ctx.service().authority().is_none() {
        log::warn!(
            "Odoo is not configured, letting `{path}` through unauthenticated",
        );
        return next.run(req).await;
    }

    let Some(session) =
        session::from_headers(ctx.service(), req.headers()).await
    else {
        return redirect_to_login(path);
    };

    let headers = req.headers_mut();
    let id = HeaderValue::from(i64::from(session.user.id));
    drop(headers.insert(USER_ID, id));
    for (name, value) in [
        (USER_LOGIN, session.username.to_string()),
        (USER_NAME, session.user.name.to_string()),
    ] {
        match HeaderValue::from_bytes(value.as_bytes()) {
            Ok(v) => drop(headers.insert(name, v)),
            Err(e) => log::warn!("cannot pass `{name}` header: {e}"),
        }
    }
    drop(req.extensions_mut().insert(session));

    next.run(req).await
}

/// Redirects to the login page, which returns back to the provided `path`
/// once signed in.
fn redirect_to_login(path: &str) -> Response {
    let location = format!(
        "/login?redirect={}",
        urlencoding::encode(path).replace("%2F", "/"),
    );
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
