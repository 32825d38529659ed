//! [Odoo] implementation of an external [`Authority`].
//!
//! Credentials are checked via the [JSON-RPC] external API, while the
//! self-service registration and its availability are driven through the
//! regular web routes of the instance.
//!
//! [JSON-RPC]: https://www.jsonrpc.org/specification
//! [Odoo]: https://www.odoo.com

mod rpc;

use std::{sync::LazyLock, time::Duration};

use derive_more::{Debug, Display, Error as StdError, From};
use regex::RegexSet;
use secrecy::ExposeSecret as _;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracerr::Traced;

use crate::domain::{
    user::{self, Partner},
    User,
};

use self::rpc::{Falsy, PartnerRecord, UserRecord};
use super::authority::{
    self, Authenticate, Authority, CheckSignup, CheckUser, Register,
    Registration, UserCheck,
};

/// [Odoo] client.
///
/// [Odoo]: https://www.odoo.com
#[derive(Clone, Debug)]
pub struct Odoo {
    /// [`Config`] of this [`Odoo`] client.
    config: Config,

    /// Underlying HTTP client.
    #[debug(skip)]
    client: reqwest::Client,
}

/// [`Odoo`] client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the [`Odoo`] instance.
    pub url: String,

    /// Name of the [`Odoo`] database (tenant).
    pub db: String,

    /// Timeout of a single HTTP request.
    pub timeout: Duration,
}

impl Odoo {
    /// `User-Agent` header sent by this client.
    pub const USER_AGENT: &'static str =
        "Mozilla/5.0 (compatible; Odoo-Next-Gateway/1.0)";

    /// Timeout of the sign-up page fetch.
    pub const SIGNUP_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new [`Odoo`] client out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// Errors if the underlying HTTP client cannot be initialized.
    pub fn new(config: Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            config: Config {
                url: config.url.trim_end_matches('/').to_owned(),
                ..config
            },
            client,
        })
    }

    /// Returns [`Config`] of this [`Odoo`] client.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the absolute URL of the provided `path` on the instance.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.url)
    }

    /// Calls the `method` of the `service` with the provided `args`.
    async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        method: &str,
        args: Value,
    ) -> Result<T, authority::Error> {
        let response = self
            .client
            .post(self.url("/jsonrpc"))
            .json(&rpc::Request::new(service, method, args))
            .send()
            .await
            .map_err(Error::from)?;
        if !response.status().is_success() {
            return Err(authority::Error::Server {
                status: response.status().as_u16(),
            });
        }

        let rpc::Response { result, error } =
            response.json().await.map_err(Error::from)?;
        if let Some(fault) = error {
            return Err(if fault.is_access_denied() {
                authority::Error::Denied
            } else {
                Error::Fault(fault.into_message()).into()
            });
        }

        Ok(serde_json::from_value(result).map_err(Error::from)?)
    }

    /// Reads the `fields` of the `model` records with the provided `ids`.
    async fn read<T: DeserializeOwned>(
        &self,
        (uid, password): (i64, &user::Password),
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<T>, authority::Error> {
        let password: &str = password.as_ref();
        self.call(
            "object",
            "execute_kw",
            json!([
                self.config.db,
                uid,
                password,
                model,
                "read",
                [ids],
                { "fields": fields },
            ]),
        )
        .await
    }

    /// Authenticates the provided credentials.
    async fn authenticate(
        &self,
        login: &user::Login,
        password: &user::Password,
    ) -> Result<Option<User>, authority::Error> {
        let (login, secret): (&str, &str) = (login.as_ref(), password.as_ref());
        let uid = match self
            .call::<Falsy<i64>>(
                "common",
                "authenticate",
                json!([self.config.db, login, secret, {}]),
            )
            .await
        {
            Ok(Falsy(Some(uid))) => uid,
            Ok(Falsy(None)) | Err(authority::Error::Denied) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };
        let creds = (uid, password);

        let record = self
            .read::<UserRecord>(creds, "res.users", &[uid], UserRecord::FIELDS)
            .await?
            .into_iter()
            .next()
            .ok_or(authority::Error::NotFound)?;

        let partner = match &record.partner_id {
            Falsy(Some((partner_id, _))) => self
                .read::<PartnerRecord>(
                    creds,
                    "res.partner",
                    &[*partner_id],
                    PartnerRecord::FIELDS,
                )
                .await
                .map(|records| records.into_iter().next().map(Partner::from))
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        "could not load `Partner(id: {partner_id})`: {e}",
                    );
                    None
                }),
            Falsy(None) => None,
        };

        let user = record.into_user(partner);
        tracing::info!(
            "authenticated `User(id: {}, login: {})`",
            user.id,
            user.login,
        );
        Ok(Some(user))
    }

    /// Submits the sign-up form of the instance.
    async fn register(
        &self,
        op: &Register,
    ) -> Result<Registration, authority::Error> {
        let (name, email): (&str, &str) = (op.name.as_ref(), op.email.as_ref());
        let password: &str = op.password.expose_secret().as_ref();
        let response = self
            .client
            .post(self.url("/web/signup"))
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .form(&[
                ("csrf_token", ""),
                ("name", name),
                ("login", email),
                ("password", password),
                ("confirm_password", password),
                ("redirect", "/web"),
                ("token", ""),
                ("db", self.config.db.as_str()),
            ])
            .send()
            .await
            .map_err(Error::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(authority::Error::Rejected(
                "invalid registration data".into(),
            ));
        }
        if status != reqwest::StatusCode::FOUND
            && status != reqwest::StatusCode::OK
        {
            return Err(authority::Error::Server {
                status: status.as_u16(),
            });
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|l| l.to_str().ok())
            .map(ToOwned::to_owned);
        if let Some(location) = location.filter(|l| l.contains("/web")) {
            return Ok(Registration::Completed {
                redirect_url: self.url(&location),
            });
        }

        let page = response.text().await.map_err(Error::from)?;
        if page.contains("already exists") || page.contains("già esiste") {
            return Err(authority::Error::Conflict);
        }
        Ok(Registration::NeedsConfirmation)
    }

    /// Asks the instance whether the described user exists.
    async fn check_user(
        &self,
        op: &CheckUser,
    ) -> Result<UserCheck, authority::Error> {
        let mut request = serde_json::Map::new();
        if let Some(username) = &op.username {
            drop(request.insert("username".into(), username.to_string().into()));
        }
        if let Some(email) = &op.email {
            drop(request.insert("email".into(), email.to_string().into()));
        }

        let response = self
            .client
            .post(self.url("/api/check_user"))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(authority::Error::Denied);
        }
        if !status.is_success() {
            return Err(authority::Error::Server {
                status: status.as_u16(),
            });
        }

        let mut body: Value = response.json().await.map_err(Error::from)?;
        let mut result =
            match body.as_object_mut().and_then(|o| o.remove("result")) {
                Some(result) => result,
                None => body,
            };

        let message = result
            .get("message")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        if result.get("status").and_then(Value::as_str) != Some("success") {
            return Err(authority::Error::Rejected(
                message.unwrap_or_else(|| "user check failed".into()),
            ));
        }

        Ok(UserCheck {
            exists: result
                .get("exists")
                .and_then(Value::as_bool)
                .unwrap_or_default(),
            message,
            user_info: result
                .get_mut("user_info")
                .map(Value::take)
                .filter(|info| !info.is_null()),
        })
    }

    /// Checks whether the login page of the instance offers a sign-up.
    async fn check_signup(&self) -> Result<bool, authority::Error> {
        /// Phrases indicating a sign-up offer on the login page.
        static PHRASES: LazyLock<RegexSet> = LazyLock::new(|| {
            RegexSet::new([
                r"(?i)signup",
                r"(?i)registra",
                r"(?i)sign up",
                r"(?i)create.*account",
                r"(?i)new.*user",
                r"(?i)don't.*have.*account",
                r"(?i)non.*ho.*account",
            ])
            .expect("valid regexes")
        });

        let response = self
            .client
            .get(self.url("/web/login"))
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .timeout(Self::SIGNUP_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(Error::from)?;
        if !response.status().is_success() {
            return Err(authority::Error::Server {
                status: response.status().as_u16(),
            });
        }

        let page = response.text().await.map_err(Error::from)?;
        Ok(PHRASES.is_match(&page))
    }
}

impl Authority<Authenticate> for Odoo {
    type Ok = Option<User>;
    type Err = Traced<authority::Error>;

    async fn execute(&self, op: Authenticate) -> Result<Self::Ok, Self::Err> {
        let Authenticate { login, password } = op;

        self.authenticate(&login, password.expose_secret())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Authority<Register> for Odoo {
    type Ok = Registration;
    type Err = Traced<authority::Error>;

    async fn execute(&self, op: Register) -> Result<Self::Ok, Self::Err> {
        self.register(&op).await.map_err(tracerr::wrap!())
    }
}

impl Authority<CheckUser> for Odoo {
    type Ok = UserCheck;
    type Err = Traced<authority::Error>;

    async fn execute(&self, op: CheckUser) -> Result<Self::Ok, Self::Err> {
        self.check_user(&op).await.map_err(tracerr::wrap!())
    }
}

impl Authority<CheckSignup> for Odoo {
    type Ok = bool;
    type Err = Traced<authority::Error>;

    async fn execute(&self, _: CheckSignup) -> Result<Self::Ok, Self::Err> {
        self.check_signup().await.map_err(tracerr::wrap!())
    }
}

/// [`Odoo`] client error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed.
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// Response cannot be decoded.
    #[display("Failed to decode a response: {_0}")]
    Decode(serde_json::Error),

    /// Remote procedure raised an exception.
    #[display("Remote procedure failed: {_0}")]
    #[from(ignore)]
    Fault(#[error(not(source))] String),
}
