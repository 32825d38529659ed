//! [`Session`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display};
use serde::{Deserialize, Serialize};

use crate::domain::{user, User};

/// Authenticated user session, carried by a signed [`Token`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Session {
    /// [`User`] this [`Session`] belongs to.
    pub user: User,

    /// Login the [`User`] authenticated with.
    pub username: user::Login,

    /// [`DateTime`] when this [`Session`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssuanceDateTime,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,

    /// Issuer of this [`Session`].
    #[serde(rename = "iss")]
    pub issuer: String,
}

impl Session {
    /// Issuer tag every [`Session`] is signed with and checked against.
    pub const ISSUER: &'static str = "odoo-next-app";

    /// [`Duration`] a [`Session`] stays valid for after its issuance.
    pub const LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Creates a new [`Session`] of the provided [`User`] issued at the
    /// provided [`DateTime`].
    #[must_use]
    pub fn new(
        user: User,
        username: user::Login,
        issued_at: IssuanceDateTime,
    ) -> Self {
        Self {
            user,
            username,
            issued_at,
            expires_at: (issued_at + Self::LIFETIME).coerce(),
            issuer: Self::ISSUER.to_owned(),
        }
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] issuance.
pub type IssuanceDateTime = DateTimeOf<(Session, unit::Issuance)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;
