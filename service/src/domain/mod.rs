//! Domain definitions.

pub mod route;
pub mod user;

pub use self::user::User;
