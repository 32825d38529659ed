//! [`Command`] for registering a new [`User`].

use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user,
    infra::{
        authority::{self, Register, Registration},
        Authority,
    },
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`] via the external [`Authority`].
#[derive(Debug)]
pub struct RegisterUser {
    /// [`user::Name`] of the new [`User`].
    pub name: user::Name,

    /// [`user::Email`] of the new [`User`].
    pub email: user::Email,

    /// Chosen [`user::Password`].
    pub password: SecretBox<user::Password>,

    /// Repeated [`user::Password`], which must match the chosen one.
    pub confirmation: SecretBox<user::Password>,
}

impl<A> Command<RegisterUser> for Service<A>
where
    A: Authority<Register, Ok = Registration, Err = Traced<authority::Error>>,
{
    type Ok = Registration;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RegisterUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterUser {
            name,
            email,
            password,
            confirmation,
        } = cmd;

        if password.expose_secret() != confirmation.expose_secret() {
            return Err(tracerr::new!(E::PasswordMismatch));
        }
        if password.expose_secret().len() < user::Password::MIN_REGISTRATION_LEN
        {
            return Err(tracerr::new!(E::PasswordTooShort));
        }

        self.authority()
            .ok_or(E::NotConfigured)
            .map_err(tracerr::wrap!())?
            .execute(Register {
                name,
                email,
                password,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`RegisterUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// External [`Authority`] error.
    #[display("`Authority` operation failed: {_0}")]
    Authority(authority::Error),

    /// External [`Authority`] is not configured.
    #[display("`Authority` is not configured")]
    #[from(ignore)]
    NotConfigured,

    /// Confirmation doesn't match the chosen [`user::Password`].
    #[display("Passwords do not match")]
    #[from(ignore)]
    PasswordMismatch,

    /// Chosen [`user::Password`] is too short.
    #[display(
        "Password must be at least {} characters long",
        user::Password::MIN_REGISTRATION_LEN
    )]
    #[from(ignore)]
    PasswordTooShort,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        infra::authority::{mock::Stub, Error as AuthorityError, Registration},
        Command as _, Config, Service,
    };

    use super::{ExecutionError, RegisterUser};

    fn cmd(email: &str, password: &str, confirmation: &str) -> RegisterUser {
        RegisterUser {
            name: "Jane Doe".parse().unwrap(),
            email: email.parse().unwrap(),
            password: SecretBox::init_with(|| password.into()),
            confirmation: SecretBox::init_with(|| confirmation.into()),
        }
    }

    fn service() -> Service<Stub> {
        Service::new(
            Config::from_secret("secret"),
            Some(Stub::with_user("taken@example.com", "password")),
        )
    }

    #[tokio::test]
    async fn validates_passwords_first() {
        let err = Service::<Stub>::new(Config::from_secret("secret"), None)
            .execute(cmd("jane@example.com", "password1", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PasswordMismatch));

        let err = service()
            .execute(cmd("jane@example.com", "short", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PasswordTooShort));
    }

    #[tokio::test]
    async fn registers_via_authority() {
        let outcome = service()
            .execute(cmd("jane@example.com", "password1", "password1"))
            .await
            .unwrap();
        assert_eq!(outcome, Registration::NeedsConfirmation);

        let err = service()
            .execute(cmd("taken@example.com", "password1", "password1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Authority(AuthorityError::Conflict),
        ));
    }

    #[tokio::test]
    async fn requires_configured_authority() {
        let err = Service::<Stub>::new(Config::from_secret("secret"), None)
            .execute(cmd("jane@example.com", "password1", "password1"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotConfigured));
    }
}
