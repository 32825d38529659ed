//! [`Query`] definition.

pub mod check_user;
pub mod signup_availability;

/// [`Query`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Query;

pub use self::{
    check_user::CheckUser, signup_availability::SignupAvailability,
};
