//! [`User`] definitions.

pub mod session;

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display, From, Into};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};

pub use self::session::Session;

/// Identity of a user, as known to the external authority.
///
/// Once issued into a [`Session`] it is never modified.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// Display [`Name`] of this [`User`].
    pub name: Name,

    /// [`Login`] of this [`User`].
    pub login: Login,

    /// [`Email`] of this [`User`].
    #[serde(default)]
    pub email: Option<Email>,

    /// Indicator whether this [`User`] is active.
    #[serde(default)]
    pub active: Option<bool>,

    /// Reference to the [`Partner`] linked with this [`User`].
    #[serde(default, rename = "partner_id")]
    pub contact: Option<Reference>,

    /// Details of the linked [`Partner`], if they could be loaded.
    #[serde(default)]
    pub partner: Option<Partner>,
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(i64);

/// Name of a [`User`] or a [`Partner`].
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Login of a [`User`].
///
/// The external authority accepts arbitrary logins (usually emails), so only
/// the surrounding whitespace and the length are restricted.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
pub struct Login(String);

impl Login {
    /// Creates a new [`Login`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `login` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    /// Creates a new [`Login`] if the given `login` is valid.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Option<Self> {
        let login = login.into();
        Self::check(&login).then_some(Self(login))
    }

    /// Checks whether the given `login` is a valid [`Login`].
    fn check(login: impl AsRef<str>) -> bool {
        let login = login.as_ref();
        login.trim() == login && !login.is_empty() && login.len() <= 256
    }
}

impl FromStr for Login {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Login`")
    }
}

impl From<Email> for Login {
    fn from(email: Email) -> Self {
        Self(email.0)
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Minimal length of a [`Password`] chosen on registration.
    pub const MIN_REGISTRATION_LEN: usize = 8;

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        !password.is_empty() && password.len() <= 128
    }

    /// Returns the length of this [`Password`] in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Indicates whether this [`Password`] is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Email address of a [`User`] or a [`Partner`].
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 320 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Reference to a record of the external authority: its ID along with its
/// display name.
///
/// Serialized as a `[id, name]` pair.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "(i64, String)", into = "(i64, String)")]
pub struct Reference {
    /// ID of the referenced record.
    pub id: i64,

    /// Display name of the referenced record.
    pub name: String,
}

impl From<(i64, String)> for Reference {
    fn from((id, name): (i64, String)) -> Self {
        Self { id, name }
    }
}

impl From<Reference> for (i64, String) {
    fn from(Reference { id, name }: Reference) -> Self {
        (id, name)
    }
}

/// Contact record linked with a [`User`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Partner {
    /// ID of this [`Partner`].
    pub id: i64,

    /// [`Name`] of this [`Partner`].
    pub name: Name,

    /// [`Email`] of this [`Partner`].
    #[serde(default)]
    pub email: Option<Email>,

    /// Landline phone number.
    #[serde(default)]
    pub phone: Option<String>,

    /// Mobile phone number.
    #[serde(default)]
    pub mobile: Option<String>,

    /// Street address.
    #[serde(default)]
    pub street: Option<String>,

    /// City.
    #[serde(default)]
    pub city: Option<String>,

    /// Postal code.
    #[serde(default)]
    pub zip: Option<String>,

    /// Country.
    #[serde(default, rename = "country_id")]
    pub country: Option<Reference>,

    /// State or province.
    #[serde(default, rename = "state_id")]
    pub state: Option<Reference>,

    /// Website URL.
    #[serde(default)]
    pub website: Option<String>,

    /// Indicator whether this [`Partner`] is a company.
    #[serde(default)]
    pub is_company: bool,

    /// Parent company.
    #[serde(default, rename = "parent_id")]
    pub parent: Option<Reference>,

    /// IDs of the categories (tags) of this [`Partner`].
    #[serde(default, rename = "category_id")]
    pub category_ids: Vec<i64>,
}
