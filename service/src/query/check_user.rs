//! [`Query`] checking whether a [`User`] exists.

use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user,
    infra::{
        authority::{self, UserCheck},
        Authority,
    },
    Service,
};

use super::Query;

/// [`Query`] checking whether a [`User`] with the provided [`user::Login`] or
/// [`user::Email`] exists in the external [`Authority`].
#[derive(Clone, Debug, Default)]
pub struct CheckUser {
    /// [`user::Login`] to look for.
    pub username: Option<user::Login>,

    /// [`user::Email`] to look for.
    pub email: Option<user::Email>,
}

impl<A> Query<CheckUser> for Service<A>
where
    A: Authority<
        authority::CheckUser,
        Ok = UserCheck,
        Err = Traced<authority::Error>,
    >,
{
    type Ok = UserCheck;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: CheckUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CheckUser { username, email } = query;
        if username.is_none() && email.is_none() {
            return Err(tracerr::new!(E::NoCriteria));
        }

        self.authority()
            .ok_or(E::NotConfigured)
            .map_err(tracerr::wrap!())?
            .execute(authority::CheckUser { username, email })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`CheckUser`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// External [`Authority`] error.
    #[display("`Authority` operation failed: {_0}")]
    Authority(authority::Error),

    /// Neither [`user::Login`] nor [`user::Email`] is provided.
    #[display("Either `username` or `email` must be provided")]
    #[from(ignore)]
    NoCriteria,

    /// External [`Authority`] is not configured.
    #[display("`Authority` is not configured")]
    #[from(ignore)]
    NotConfigured,
}

#[cfg(test)]
mod spec {
    use crate::{
        infra::authority::mock::Stub, Config, Query as _, Service,
    };

    use super::{CheckUser, ExecutionError};

    fn service() -> Service<Stub> {
        Service::new(
            Config::from_secret("secret"),
            Some(Stub::with_user("admin@example.com", "admin")),
        )
    }

    #[tokio::test]
    async fn requires_criteria() {
        let err = service()
            .execute(CheckUser::default())
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoCriteria));
    }

    #[tokio::test]
    async fn looks_up_by_login_or_email() {
        let check = service()
            .execute(CheckUser {
                username: None,
                email: Some("admin@example.com".parse().unwrap()),
            })
            .await
            .unwrap();
        assert!(check.exists);

        let check = service()
            .execute(CheckUser {
                username: Some("ghost".parse().unwrap()),
                email: None,
            })
            .await
            .unwrap();
        assert!(!check.exists);
    }

    #[tokio::test]
    async fn requires_configured_authority() {
        let err = Service::<Stub>::new(Config::from_secret("secret"), None)
            .execute(CheckUser {
                username: Some("admin".parse().unwrap()),
                email: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotConfigured));
    }
}
