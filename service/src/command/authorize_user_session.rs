//! [`Command`] for authorizing a [`Session`].

use common::DateTime;
use derive_more::{Display, Error, From};
use jsonwebtoken::{errors::ErrorKind, Algorithm, Validation};
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<A> Command<AuthorizeUserSession> for Service<A> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeUserSession { token } = cmd;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[Session::ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &validation,
        )
        .map_err(tracerr::from_and_wrap!(=> ExecutionError))?
        .claims;

        // `exp` is inclusive for `jsonwebtoken`, while a `Session` expires
        // exactly at its `expires_at`.
        if session.expires_at <= DateTime::now().coerce() {
            return Err(tracerr::new!(ExecutionError::Expired));
        }

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// [`session::Token`] is not a well-formed JSON Web Token, or its claims
    /// are not a [`Session`].
    #[display("Malformed JSON Web Token: {_0}")]
    Malformed(jsonwebtoken::errors::Error),

    /// Signature of the [`session::Token`] doesn't match its contents.
    #[display("JSON Web Token signature is invalid")]
    SignatureInvalid,

    /// [`session::Token`] is issued by someone else.
    #[display("JSON Web Token is issued by a foreign issuer")]
    IssuerMismatch,

    /// [`Session`] has expired.
    #[display("`Session` has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for ExecutionError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::SignatureInvalid,
            ErrorKind::InvalidIssuer => Self::IssuerMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(err),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::{create_user_session, CreateUserSession},
        domain::user::{session, Session},
        infra::authority::mock::{self, Stub},
        Command as _, Config, Service,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    fn service() -> Service<Stub> {
        Service::new(Config::from_secret("secret"), None)
    }

    async fn issue(service: &Service<Stub>) -> create_user_session::Output {
        service
            .execute(CreateUserSession::ByUser {
                user: mock::user("admin"),
                username: "admin".parse().unwrap(),
            })
            .await
            .unwrap()
    }

    #[expect(unsafe_code, reason = "test")]
    fn token(s: impl Into<String>) -> session::Token {
        unsafe { session::Token::new_unchecked(s.into()) }
    }

    async fn authorize(
        service: &Service<Stub>,
        token: session::Token,
    ) -> Result<Session, ExecutionError> {
        service
            .execute(AuthorizeUserSession { token })
            .await
            .map_err(tracerr::Traced::into_inner)
    }

    #[tokio::test]
    async fn rejects_tampered_signature() {
        let service = service();
        let output = issue(&service).await;

        let (rest, signature) = output.token.as_ref().rsplit_once('.').unwrap();
        let mut chars = signature.chars();
        let first = match chars.next().unwrap() {
            'A' => 'B',
            _ => 'A',
        };
        let tampered = format!("{rest}.{first}{}", chars.as_str());

        let err = authorize(&service, token(tampered)).await.unwrap_err();
        assert!(matches!(err, ExecutionError::SignatureInvalid), "{err}");
    }

    #[tokio::test]
    async fn rejects_foreign_secret() {
        let output = issue(&Service::new(Config::from_secret("other"), None))
            .await;

        let err = authorize(&service(), output.token).await.unwrap_err();
        assert!(matches!(err, ExecutionError::SignatureInvalid), "{err}");
    }

    #[tokio::test]
    async fn rejects_foreign_issuer() {
        let mut session = Session::new(
            mock::user("admin"),
            "admin".parse().unwrap(),
            DateTime::now().coerce(),
        );
        session.issuer = "someone-else".into();
        let encoded = jsonwebtoken::encode(
            &Header::default(),
            &session,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = authorize(&service(), token(encoded)).await.unwrap_err();
        assert!(matches!(err, ExecutionError::IssuerMismatch), "{err}");
    }

    #[tokio::test]
    async fn rejects_expired_session() {
        let issued_at = DateTime::now() - Session::LIFETIME;
        let session = Session::new(
            mock::user("admin"),
            "admin".parse().unwrap(),
            (issued_at - Duration::from_secs(1)).coerce(),
        );
        let encoded = jsonwebtoken::encode(
            &Header::default(),
            &session,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = authorize(&service(), token(encoded)).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Expired), "{err}");
    }

    #[tokio::test]
    async fn rejects_session_expiring_right_now() {
        let session = Session::new(
            mock::user("admin"),
            "admin".parse().unwrap(),
            (DateTime::now() - Session::LIFETIME).coerce(),
        );
        let encoded = jsonwebtoken::encode(
            &Header::default(),
            &session,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = authorize(&service(), token(encoded)).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Expired), "{err}");
    }

    #[tokio::test]
    async fn rejects_garbage() {
        for garbage in ["", "not-a-token", "a.b.c"] {
            let err = authorize(&service(), token(garbage)).await.unwrap_err();
            assert!(matches!(err, ExecutionError::Malformed(_)), "{err}");
        }
    }
}
