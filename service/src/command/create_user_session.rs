//! [`Command`] for creating a [`Session`].

use common::DateTime;
use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Login, Password};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{
        authority::{self, Authenticate},
        Authority,
    },
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Debug)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials, checked by the
    /// external [`Authority`].
    ByCredentials {
        /// [`Login`] of a [`User`].
        login: user::Login,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] for an already authenticated [`User`].
    ByUser {
        /// [`User`] to create the [`Session`] for.
        user: User,

        /// [`Login`] the [`User`] authenticated with.
        username: user::Login,
    },
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`session::Token`] of the created [`Session`].
    pub token: session::Token,

    /// Created [`Session`].
    pub session: Session,
}

impl<A> Command<CreateUserSession> for Service<A>
where
    A: Authority<Authenticate, Ok = Option<User>, Err = Traced<authority::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let (user, username) = match cmd {
            Cmd::ByCredentials { login, password } => {
                let user = self
                    .authority()
                    .ok_or(E::NotConfigured)
                    .map_err(tracerr::wrap!())?
                    .execute(Authenticate {
                        login: login.clone(),
                        password,
                    })
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;
                (user, login)
            }
            Cmd::ByUser { user, username } => (user, username),
        };

        let session = Session::new(user, username, DateTime::now().coerce());
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &session,
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        Ok(Output { token, session })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// External [`Authority`] error.
    #[display("`Authority` operation failed: {_0}")]
    Authority(authority::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// External [`Authority`] is not configured.
    #[display("`Authority` is not configured")]
    #[from(ignore)]
    NotConfigured,

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    #[from(ignore)]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::SecretBox;

    use crate::{
        command::{AuthorizeUserSession, CreateUserSession},
        domain::user::Session,
        infra::authority::mock::{self, Stub},
        Command as _, Config, Service,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn issues_session_by_credentials() {
        let service = Service::new(
            Config::from_secret("secret"),
            Some(Stub::with_user("admin", "admin")),
        );

        let output = service
            .execute(CreateUserSession::ByCredentials {
                login: "admin".parse().unwrap(),
                password: SecretBox::init_with(|| "admin".into()),
            })
            .await
            .unwrap();

        assert_eq!(output.session.user, mock::user("admin"));
        assert_eq!(output.session.username.to_string(), "admin");
        assert_eq!(output.session.issuer, Session::ISSUER);
        assert_eq!(
            output
                .session
                .expires_at
                .duration_since(output.session.issued_at),
            Some(Duration::from_secs(7 * 24 * 60 * 60)),
        );

        let verified = service
            .execute(AuthorizeUserSession {
                token: output.token,
            })
            .await
            .unwrap();
        assert_eq!(verified, output.session);
    }

    #[tokio::test]
    async fn rejects_wrong_credentials() {
        let service = Service::new(
            Config::from_secret("secret"),
            Some(Stub::with_user("admin", "admin")),
        );

        let err = service
            .execute(CreateUserSession::ByCredentials {
                login: "admin".parse().unwrap(),
                password: SecretBox::init_with(|| "wrong".into()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }

    #[tokio::test]
    async fn requires_configured_authority() {
        let service = Service::<Stub>::new(Config::from_secret("secret"), None);

        let err = service
            .execute(CreateUserSession::ByCredentials {
                login: "admin".parse().unwrap(),
                password: SecretBox::init_with(|| "admin".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotConfigured));

        let output = service
            .execute(CreateUserSession::ByUser {
                user: mock::user("admin"),
                username: "admin".parse().unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(output.token.as_ref().split('.').count(), 3);
    }
}
