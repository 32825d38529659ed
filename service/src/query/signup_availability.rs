//! [`Query`] checking whether a self-service registration is available.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{Display, Error};
use tracerr::Traced;
use tracing as log;

use crate::{
    infra::{
        authority::{self, CheckSignup},
        Authority,
    },
    Service,
};

use super::Query;

/// [`Query`] checking whether the external [`Authority`] offers a
/// self-service registration.
#[derive(Clone, Copy, Debug)]
pub struct SignupAvailability;

/// Result of a [`SignupAvailability`] [`Query`].
#[derive(Clone, Debug)]
pub struct Availability {
    /// Indicator whether a self-service registration is available.
    pub available: bool,

    /// [`DateTime`] when the availability was checked.
    pub checked_at: CheckDateTime,

    /// Message of the error preventing the check, if any.
    pub error: Option<String>,
}

/// [`DateTime`] of an [`Availability`] check.
pub type CheckDateTime = DateTimeOf<(Availability, unit::Check)>;

impl<A> Query<SignupAvailability> for Service<A>
where
    A: Authority<CheckSignup, Ok = bool, Err = Traced<authority::Error>>,
{
    type Ok = Availability;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: SignupAvailability,
    ) -> Result<Self::Ok, Self::Err> {
        let authority = self
            .authority()
            .ok_or(ExecutionError::NotConfigured)
            .map_err(tracerr::wrap!())?;

        let (available, error) = match authority.execute(CheckSignup).await {
            Ok(available) => (available, None),
            Err(e) => {
                log::warn!("failed to check sign-up availability: {e}");
                (false, Some(e.into_inner().to_string()))
            }
        };

        Ok(Availability {
            available,
            checked_at: DateTime::now().coerce(),
            error,
        })
    }
}

/// Error of [`SignupAvailability`] [`Query`] execution.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ExecutionError {
    /// External [`Authority`] is not configured.
    #[display("`Authority` is not configured")]
    NotConfigured,
}
