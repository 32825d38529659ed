//! [JSON-RPC] envelopes and records of the [Odoo] external API.
//!
//! [JSON-RPC]: https://www.jsonrpc.org/specification
//! [Odoo]: https://www.odoo.com/documentation/17.0/developer/reference/external_api.html

use std::sync::atomic::{self, AtomicU64};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{
    user::{self, Partner, Reference},
    User,
};

/// Counter of the issued request IDs.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// [JSON-RPC] request calling a `method` of an [Odoo] `service`.
///
/// [JSON-RPC]: https://www.jsonrpc.org/specification
/// [Odoo]: https://www.odoo.com
#[derive(Debug, Serialize)]
pub(super) struct Request<'a> {
    /// Protocol version.
    jsonrpc: &'static str,

    /// Dispatching method, always `call`.
    method: &'static str,

    /// Parameters of the call.
    params: Params<'a>,

    /// ID of this [`Request`].
    id: u64,
}

/// Parameters of a [`Request`].
#[derive(Debug, Serialize)]
struct Params<'a> {
    /// Name of the called service (`common` or `object`).
    service: &'a str,

    /// Name of the called method.
    method: &'a str,

    /// Positional arguments of the method.
    args: Value,
}

impl<'a> Request<'a> {
    /// Creates a new [`Request`] of the provided `service` `method`.
    pub(super) fn new(service: &'a str, method: &'a str, args: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            params: Params {
                service,
                method,
                args,
            },
            id: NEXT_ID.fetch_add(1, atomic::Ordering::Relaxed),
        }
    }
}

/// [JSON-RPC] response envelope.
///
/// [JSON-RPC]: https://www.jsonrpc.org/specification
#[derive(Debug, Deserialize)]
pub(super) struct Response {
    /// Result of a successful call.
    #[serde(default)]
    pub(super) result: Value,

    /// Error of a failed call.
    #[serde(default)]
    pub(super) error: Option<Fault>,
}

/// Error of a failed [JSON-RPC] call.
///
/// [JSON-RPC]: https://www.jsonrpc.org/specification
#[derive(Debug, Deserialize)]
pub(super) struct Fault {
    /// Generic message, like `Odoo Server Error`.
    pub(super) message: String,

    /// Details of the raised server exception.
    #[serde(default)]
    pub(super) data: Option<FaultData>,
}

/// Details of the exception behind a [`Fault`].
#[derive(Debug, Deserialize)]
pub(super) struct FaultData {
    /// Qualified name of the exception class.
    #[serde(default)]
    pub(super) name: String,

    /// Message of the exception.
    #[serde(default)]
    pub(super) message: String,
}

impl Fault {
    /// Indicates whether this [`Fault`] is caused by wrong credentials or
    /// missing access rights.
    pub(super) fn is_access_denied(&self) -> bool {
        self.data.as_ref().is_some_and(|d| {
            d.name.ends_with("AccessDenied") || d.name.ends_with("AccessError")
        })
    }

    /// Returns the most specific message of this [`Fault`].
    pub(super) fn into_message(self) -> String {
        match self.data {
            Some(FaultData { message, .. }) if !message.is_empty() => message,
            _ => self.message,
        }
    }
}

/// [Odoo] value being `false` when unset.
///
/// [Odoo]: https://www.odoo.com
#[derive(Debug)]
pub(super) struct Falsy<T>(pub(super) Option<T>);

impl<T> Default for Falsy<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<'de, T> Deserialize<'de> for Falsy<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Set(T),
            Unset(
                #[expect(dead_code, reason = "only the shape is matched")]
                Option<bool>,
            ),
        }

        Ok(Self(match Repr::deserialize(deserializer)? {
            Repr::Set(v) => Some(v),
            Repr::Unset(_) => None,
        }))
    }
}

/// `res.users` record.
#[derive(Debug, Deserialize)]
pub(super) struct UserRecord {
    /// ID of the user.
    id: i64,

    /// Display name of the user.
    name: String,

    /// Login of the user.
    login: String,

    /// Email of the user.
    #[serde(default)]
    email: Falsy<String>,

    /// Indicator whether the user is active.
    #[serde(default)]
    active: Option<bool>,

    /// Linked partner.
    #[serde(default)]
    pub(super) partner_id: Falsy<(i64, String)>,
}

impl UserRecord {
    /// Fields to read for a [`UserRecord`].
    pub(super) const FIELDS: &'static [&'static str] =
        &["id", "name", "login", "email", "active", "partner_id"];

    /// Converts this [`UserRecord`] into a [`User`] with the provided
    /// [`Partner`] details.
    #[expect(unsafe_code, reason = "authority is the source of truth")]
    pub(super) fn into_user(self, partner: Option<Partner>) -> User {
        let Self {
            id,
            name,
            login,
            email,
            active,
            partner_id,
        } = self;

        // SAFETY: Records of the authority are accepted as they are.
        let (name, login, email) = unsafe {
            (
                user::Name::new_unchecked(name),
                user::Login::new_unchecked(login),
                email.0.map(|e| user::Email::new_unchecked(e)),
            )
        };

        User {
            id: id.into(),
            name,
            login,
            email,
            active,
            contact: partner_id.0.map(Reference::from),
            partner,
        }
    }
}

/// `res.partner` record.
#[derive(Debug, Deserialize)]
pub(super) struct PartnerRecord {
    /// ID of the partner.
    id: i64,

    /// Display name of the partner.
    name: String,

    /// Email of the partner.
    #[serde(default)]
    email: Falsy<String>,

    /// Landline phone number.
    #[serde(default)]
    phone: Falsy<String>,

    /// Mobile phone number.
    #[serde(default)]
    mobile: Falsy<String>,

    /// Street address.
    #[serde(default)]
    street: Falsy<String>,

    /// City.
    #[serde(default)]
    city: Falsy<String>,

    /// Postal code.
    #[serde(default)]
    zip: Falsy<String>,

    /// Country.
    #[serde(default)]
    country_id: Falsy<(i64, String)>,

    /// State or province.
    #[serde(default)]
    state_id: Falsy<(i64, String)>,

    /// Website URL.
    #[serde(default)]
    website: Falsy<String>,

    /// Indicator whether the partner is a company.
    #[serde(default)]
    is_company: bool,

    /// Parent company.
    #[serde(default)]
    parent_id: Falsy<(i64, String)>,

    /// IDs of the partner categories.
    #[serde(default)]
    category_id: Vec<i64>,
}

impl PartnerRecord {
    /// Fields to read for a [`PartnerRecord`].
    ///
    /// `image_1920` is never read, as it makes the session token too large.
    pub(super) const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "phone",
        "mobile",
        "street",
        "city",
        "zip",
        "country_id",
        "state_id",
        "website",
        "is_company",
        "parent_id",
        "category_id",
    ];
}

impl From<PartnerRecord> for Partner {
    #[expect(unsafe_code, reason = "authority is the source of truth")]
    fn from(record: PartnerRecord) -> Self {
        let PartnerRecord {
            id,
            name,
            email,
            phone,
            mobile,
            street,
            city,
            zip,
            country_id,
            state_id,
            website,
            is_company,
            parent_id,
            category_id,
        } = record;

        // SAFETY: Records of the authority are accepted as they are.
        let (name, email) = unsafe {
            (
                user::Name::new_unchecked(name),
                email.0.map(|e| user::Email::new_unchecked(e)),
            )
        };

        Self {
            id,
            name,
            email,
            phone: phone.0,
            mobile: mobile.0,
            street: street.0,
            city: city.0,
            zip: zip.0,
            country: country_id.0.map(Reference::from),
            state: state_id.0.map(Reference::from),
            website: website.0,
            is_company,
            parent: parent_id.0.map(Reference::from),
            category_ids: category_id,
        }
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use super::{Falsy, Response, UserRecord};

    #[test]
    fn decodes_falsy_values() {
        let record: UserRecord = serde_json::from_value(json!({
            "id": 2,
            "name": "Mitchell Admin",
            "login": "admin",
            "email": false,
            "active": true,
            "partner_id": [3, "Mitchell Admin"],
        }))
        .unwrap();
        let user = record.into_user(None);

        assert_eq!(user.email, None);
        assert_eq!(user.active, Some(true));
        assert_eq!(user.contact.map(|r| r.id), Some(3));

        let uid: Falsy<i64> = serde_json::from_value(json!(false)).unwrap();
        assert!(uid.0.is_none());
        let uid: Falsy<i64> = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(uid.0, Some(7));
    }

    #[test]
    fn detects_access_denied_faults() {
        let response: Response = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {
                    "name": "odoo.exceptions.AccessDenied",
                    "message": "Access Denied",
                },
            },
        }))
        .unwrap();
        let fault = response.error.unwrap();

        assert!(fault.is_access_denied());
        assert_eq!(fault.into_message(), "Access Denied");
    }
}
