//! Session cookie handling.
//!
//! The [`session::Token`] travels between the browser and the gateway in a
//! single `HttpOnly` cookie named [`NAME`].

use axum_extra::extract::cookie::{Cookie, SameSite};
use service::domain::user::{session, Session};

use crate::config::Environment;

/// Name of the session cookie.
pub const NAME: &str = "odoo-session";

/// Returns the `Set-Cookie` header value storing the provided
/// [`session::Token`] for the whole [`Session::LIFETIME`].
///
/// The `Secure` attribute is set in the [`Environment::Production`] only.
#[must_use]
pub fn serialize(token: &session::Token, environment: Environment) -> String {
    #[expect(clippy::cast_possible_wrap, reason = "fits into `i64`")]
    let max_age = Session::LIFETIME.as_secs() as i64;

    Cookie::build((NAME, token.to_string()))
        .max_age(time::Duration::seconds(max_age))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(environment == Environment::Production)
        .build()
        .to_string()
}

/// Returns the `Set-Cookie` header value removing the session cookie.
#[must_use]
pub fn clear() -> String {
    Cookie::build((NAME, ""))
        .max_age(time::Duration::ZERO)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
        .to_string()
}

/// Extracts the [`session::Token`] from the provided raw `Cookie` header.
///
/// Malformed pairs are skipped, and an empty value counts as absent.
#[must_use]
pub fn parse(raw: &str) -> Option<session::Token> {
    let value = Cookie::split_parse(raw)
        .filter_map(Result::ok)
        .find(|c| c.name() == NAME)?
        .value()
        .to_owned();
    if value.is_empty() {
        return None;
    }

    // SAFETY: The token is opaque until it's verified.
    #[expect(unsafe_code, reason = "verified by the caller")]
    let token = unsafe { session::Token::new_unchecked(value) };
    Some(token)
}

#[cfg(test)]
mod spec {
    use service::domain::user::session;

    use crate::config::Environment;

    use super::{clear, parse, serialize};

    #[expect(unsafe_code, reason = "test")]
    fn token(s: &str) -> session::Token {
        unsafe { session::Token::new_unchecked(s.to_owned()) }
    }

    #[test]
    fn parses_session_cookie() {
        assert_eq!(
            parse("odoo-session=abc; other=1").map(|t| t.to_string()),
            Some("abc".to_owned()),
        );
        assert_eq!(
            parse("other=1;odoo-session=abc.def.ghi").map(|t| t.to_string()),
            Some("abc.def.ghi".to_owned()),
        );
        assert_eq!(
            parse("garbage; odoo-session=x").map(|t| t.to_string()),
            Some("x".to_owned()),
        );
    }

    #[test]
    fn treats_missing_or_empty_cookie_as_absent() {
        assert!(parse("").is_none());
        assert!(parse("other=1").is_none());
        assert!(parse("odoo-session=").is_none());
        assert!(parse("odoo-sessionx=abc").is_none());
    }

    #[test]
    fn serializes_cookie_attributes() {
        let dev = serialize(&token("abc"), Environment::Development);
        assert!(dev.starts_with("odoo-session=abc"), "{dev}");
        for attr in ["Max-Age=604800", "Path=/", "HttpOnly", "SameSite=Strict"]
        {
            assert!(dev.contains(attr), "{dev}");
        }
        assert!(!dev.contains("Secure"), "{dev}");

        let prod = serialize(&token("abc"), Environment::Production);
        assert!(prod.contains("; Secure"), "{prod}");
    }

    #[test]
    fn clears_cookie() {
        let cleared = clear();

        assert!(cleared.starts_with("odoo-session=;"), "{cleared}");
        assert!(cleared.contains("Max-Age=0"), "{cleared}");
        assert!(cleared.contains("Path=/"), "{cleared}");
        assert!(parse(&cleared).is_none());
    }
}
