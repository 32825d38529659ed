//! Infrastructure layer.

pub mod authority;
#[cfg(feature = "odoo")]
pub mod odoo;

pub use self::authority::Authority;
#[cfg(feature = "odoo")]
pub use self::odoo::Odoo;
