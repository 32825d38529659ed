//! [`Authority`]-related definitions.
//!
//! An [`Authority`] is the external system holding the real user and
//! credential records. Its answers are decoded at the boundary into explicit
//! outcomes: either a successful value, or one of the [`Error`] variants.

use derive_more::{Display, Error as StdError};
use secrecy::SecretBox;

#[cfg(feature = "odoo")]
use super::odoo;
#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Operation performed by an external authority.
pub use common::Handler as Authority;

/// Checks the provided credentials, resolving the [`User`] they belong to.
///
/// [`Authority`] returns [`None`] if the credentials are wrong.
#[derive(Debug)]
pub struct Authenticate {
    /// [`user::Login`] to authenticate with.
    pub login: user::Login,

    /// [`user::Password`] to authenticate with.
    pub password: SecretBox<user::Password>,
}

/// Requests a self-service registration of a new [`User`].
#[derive(Debug)]
pub struct Register {
    /// [`user::Name`] of the new [`User`].
    pub name: user::Name,

    /// [`user::Email`] of the new [`User`], used as its login.
    pub email: user::Email,

    /// [`user::Password`] of the new [`User`].
    pub password: SecretBox<user::Password>,
}

/// Outcome of a successful [`Register`] operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Registration {
    /// Registration is completed and the new [`User`] may sign in.
    Completed {
        /// URL the [`Authority`] redirected the new [`User`] to.
        redirect_url: String,
    },

    /// Registration is accepted, but must be confirmed (by email, usually).
    NeedsConfirmation,
}

/// Checks whether a [`User`] with the provided login or email exists.
#[derive(Clone, Debug)]
pub struct CheckUser {
    /// [`user::Login`] to look for.
    pub username: Option<user::Login>,

    /// [`user::Email`] to look for.
    pub email: Option<user::Email>,
}

/// Outcome of a successful [`CheckUser`] operation.
#[derive(Clone, Debug, PartialEq)]
pub struct UserCheck {
    /// Indicator whether the looked up [`User`] exists.
    pub exists: bool,

    /// Human-readable message of the [`Authority`].
    pub message: Option<String>,

    /// Additional information about the found [`User`], passed as is.
    pub user_info: Option<serde_json::Value>,
}

/// Checks whether the [`Authority`] offers a self-service registration.
#[derive(Clone, Copy, Debug)]
pub struct CheckSignup;

/// [`Authority`] error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// [`Authority`] denied the access.
    #[display("Access denied by the authority")]
    Denied,

    /// Requested record does not exist.
    #[display("Requested record does not exist")]
    NotFound,

    /// Record being created already exists.
    #[display("Record already exists")]
    Conflict,

    /// [`Authority`] rejected the request with the provided message.
    #[display("Request rejected: {_0}")]
    Rejected(#[error(not(source))] String),

    /// [`Authority`] failed with an unexpected HTTP status.
    #[display("Authority responded with `{status}` status")]
    Server {
        /// HTTP status code the [`Authority`] responded with.
        status: u16,
    },

    #[cfg(feature = "odoo")]
    /// [`odoo`] client error.
    #[display("Odoo client failed: {_0}")]
    Odoo(odoo::Error),
}

#[cfg(feature = "odoo")]
impl From<odoo::Error> for Error {
    fn from(err: odoo::Error) -> Self {
        Self::Odoo(err)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory [`Authority`] for tests.

    use secrecy::ExposeSecret as _;
    use tracerr::Traced;

    use crate::domain::{user, User};

    use super::{
        Authenticate, Authority, CheckSignup, CheckUser, Error, Register,
        Registration, UserCheck,
    };

    /// Creates a new [`User`] with the provided `login`.
    pub(crate) fn user(login: &str) -> User {
        User {
            id: 2_i64.into(),
            name: "Mitchell Admin".parse().unwrap(),
            login: login.parse().unwrap(),
            email: login.parse().ok(),
            active: Some(true),
            contact: None,
            partner: None,
        }
    }

    /// [`Authority`] knowing a fixed set of [`User`]s.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Stub {
        /// Known [`User`]s along with their [`user::Password`]s.
        users: Vec<(User, user::Password)>,

        /// Answer to [`CheckSignup`], failing if [`None`].
        signup: Option<bool>,
    }

    impl Stub {
        /// Creates a new [`Stub`] knowing a single [`User`].
        pub(crate) fn with_user(login: &str, password: &str) -> Self {
            Self {
                users: vec![(user(login), password.into())],
                signup: None,
            }
        }

        /// Sets the answer to [`CheckSignup`].
        pub(crate) fn with_signup(mut self, available: bool) -> Self {
            self.signup = Some(available);
            self
        }

        fn find(&self, login: &str) -> Option<&(User, user::Password)> {
            self.users
                .iter()
                .find(|(u, _)| AsRef::<str>::as_ref(&u.login) == login)
        }
    }

    impl Authority<Authenticate> for Stub {
        type Ok = Option<User>;
        type Err = Traced<Error>;

        async fn execute(
            &self,
            op: Authenticate,
        ) -> Result<Self::Ok, Self::Err> {
            Ok(self
                .find(AsRef::<str>::as_ref(&op.login))
                .filter(|(_, p)| p == op.password.expose_secret())
                .map(|(u, _)| u.clone()))
        }
    }

    impl Authority<Register> for Stub {
        type Ok = Registration;
        type Err = Traced<Error>;

        async fn execute(&self, op: Register) -> Result<Self::Ok, Self::Err> {
            if self.find(AsRef::<str>::as_ref(&op.email)).is_some() {
                return Err(tracerr::new!(Error::Conflict));
            }
            Ok(Registration::NeedsConfirmation)
        }
    }

    impl Authority<CheckUser> for Stub {
        type Ok = UserCheck;
        type Err = Traced<Error>;

        async fn execute(&self, op: CheckUser) -> Result<Self::Ok, Self::Err> {
            let exists = op
                .username
                .iter()
                .map(AsRef::<str>::as_ref)
                .chain(op.email.iter().map(AsRef::<str>::as_ref))
                .any(|login| self.find(login).is_some());
            Ok(UserCheck {
                exists,
                message: None,
                user_info: None,
            })
        }
    }

    impl Authority<CheckSignup> for Stub {
        type Ok = bool;
        type Err = Traced<Error>;

        async fn execute(&self, _: CheckSignup) -> Result<Self::Ok, Self::Err> {
            self.signup
                .ok_or(Error::Server { status: 502 })
                .map_err(tracerr::wrap!())
        }
    }
}
