//! Authentication endpoints.

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse as _, Response},
    Json,
};
use common::DateTime;
use derive_more::Debug;
use http::{header, HeaderMap, StatusCode};
use secrecy::SecretBox;
use serde::Deserialize;
use serde_json::{json, Value};
use service::{
    command::{self, Command as _},
    domain::user::{self, Session},
    infra::authority::{self, Registration},
    query::{self, signup_availability::Availability},
};
use tracing as log;

use crate::{cookie, define_error, session, AsError, Context, Error};

/// Request of the [`login()`] endpoint.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Login of the user.
    #[serde(default)]
    pub username: Option<String>,

    /// Password of the user.
    #[debug(skip)]
    #[serde(default)]
    pub password: Option<String>,
}

/// Signs the user in with the provided [`Credentials`], storing the new
/// [`Session`] in a cookie.
///
/// # Errors
///
/// Possible error codes:
/// - `MISSING_CREDENTIALS` - username or password is not provided;
/// - `NOT_CONFIGURED` - Odoo is not configured;
/// - `WRONG_CREDENTIALS` - Odoo doesn't recognize the credentials.
#[tracing::instrument(skip_all, fields(http.handler = "login"))]
pub async fn login(
    ctx: Context,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(Credentials { username, password }) =
        payload.map_err(AsError::into_error)?;
    let (Some(username), Some(password)) = (
        username.filter(|u| !u.trim().is_empty()),
        password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AuthError::MissingCredentials.into());
    };
    let login = user::Login::new(username.trim())
        .ok_or(AuthError::WrongCredentials)?;

    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByCredentials {
            login,
            password: SecretBox::init_with(move || password.into()),
        })
        .await
        .map_err(AsError::into_error)?;

    let user = &output.session.user;
    log::info!("`User(id: {})` signed in as `{}`", user.id, user.login);

    Ok((
        [(
            header::SET_COOKIE,
            cookie::serialize(&output.token, ctx.environment()),
        )],
        Json(json!({
            "success": true,
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "login": user.login,
            },
        })),
    )
        .into_response())
}

/// Signs the user out, removing the session cookie.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, cookie::clear())],
        Json(json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    )
        .into_response()
}

/// Returns the current [`Session`].
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` - no valid session cookie is provided.
#[tracing::instrument(skip_all, fields(http.handler = "me"))]
pub async fn me(ctx: Context, headers: HeaderMap) -> Result<Json<Value>, Error> {
    let Session {
        user,
        username,
        issued_at,
        expires_at,
        issuer: _,
    } = session::from_headers(ctx.service(), &headers)
        .await
        .ok_or(AuthError::AuthorizationRequired)?;

    Ok(Json(json!({
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "login": user.login,
            "active": user.active,
            "partner_id": user.contact,
        },
        "partner": user.partner,
        "username": username,
        "sessionInfo": {
            "iat": issued_at.unix_timestamp(),
            "exp": expires_at.unix_timestamp(),
        },
    })))
}

/// Request of the [`register()`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    /// Email of the new user, used as its login.
    #[serde(default)]
    pub email: Option<String>,

    /// Display name of the new user.
    #[serde(default)]
    pub name: Option<String>,

    /// Chosen password.
    #[debug(skip)]
    #[serde(default)]
    pub password: Option<String>,

    /// Repeated password.
    #[debug(skip)]
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Registers a new user in Odoo.
///
/// # Errors
///
/// Possible error codes:
/// - `MISSING_FIELDS` - any of the [`SignUp`] fields is not provided;
/// - `INVALID_EMAIL`, `INVALID_NAME` - provided data has a wrong format;
/// - `PASSWORD_MISMATCH` - passwords do not match;
/// - `PASSWORD_TOO_SHORT` - password is too short;
/// - `NOT_CONFIGURED` - Odoo is not configured;
/// - `USER_EXISTS` - user with the provided email already exists;
/// - `REJECTED` - Odoo rejected the provided data.
#[tracing::instrument(skip_all, fields(http.handler = "register"))]
pub async fn register(
    ctx: Context,
    payload: Result<Json<SignUp>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(SignUp {
        email,
        name,
        password,
        confirm_password,
    }) = payload.map_err(AsError::into_error)?;
    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    let (Some(email), Some(name), Some(password), Some(confirmation)) = (
        non_empty(email),
        non_empty(name),
        non_empty(password),
        non_empty(confirm_password),
    ) else {
        return Err(AuthError::MissingFields.into());
    };
    let email =
        user::Email::new(email.trim()).ok_or(AuthError::InvalidEmail)?;
    let name = user::Name::new(name.trim()).ok_or(AuthError::InvalidName)?;

    let registration = ctx
        .service()
        .execute(command::RegisterUser {
            name,
            email,
            password: SecretBox::init_with(move || password.into()),
            confirmation: SecretBox::init_with(move || confirmation.into()),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(match registration {
        Registration::Completed { redirect_url } => json!({
            "success": true,
            "message": "Registration completed successfully",
            "redirectUrl": redirect_url,
        }),
        Registration::NeedsConfirmation => json!({
            "success": true,
            "message": "Registration submitted, check your email to \
                        confirm the account",
            "needsConfirmation": true,
        }),
    }))
}

/// Request of the [`check_user()`] endpoint.
#[derive(Debug, Deserialize)]
pub struct UserLookup {
    /// Email to look for.
    #[serde(default)]
    pub email: Option<String>,

    /// Login to look for.
    #[serde(default)]
    pub username: Option<String>,
}

/// Checks whether a user exists in Odoo.
///
/// # Errors
///
/// Possible error codes:
/// - `MISSING_CRITERIA` - neither email nor username is provided;
/// - `INVALID_EMAIL`, `INVALID_USERNAME` - provided data has a wrong format;
/// - `NOT_CONFIGURED` - Odoo is not configured;
/// - `ACCESS_DENIED` - Odoo denied the lookup;
/// - `REJECTED` - Odoo rejected the lookup.
#[tracing::instrument(skip_all, fields(http.handler = "check_user"))]
pub async fn check_user(
    ctx: Context,
    payload: Result<Json<UserLookup>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(UserLookup { email, username }) =
        payload.map_err(AsError::into_error)?;

    let email = email
        .filter(|e| !e.trim().is_empty())
        .map(|e| user::Email::new(e.trim()).ok_or(AuthError::InvalidEmail))
        .transpose()?;
    let username = username
        .filter(|u| !u.trim().is_empty())
        .map(|u| user::Login::new(u.trim()).ok_or(AuthError::InvalidUsername))
        .transpose()?;

    let check = ctx
        .service()
        .execute(query::CheckUser { username, email })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(json!({
        "success": true,
        "exists": check.exists,
        "message": check.message,
        "user_info": check.user_info,
    })))
}

/// Checks whether Odoo offers a self-service registration.
#[tracing::instrument(skip_all, fields(http.handler = "signup_check"))]
pub async fn signup_check(ctx: Context) -> Response {
    match ctx.service().execute(query::SignupAvailability).await {
        Ok(Availability {
            available,
            checked_at,
            error,
        }) => {
            let config = ctx.service().authority().map(|odoo| {
                let config = odoo.config();
                json!({ "url": config.url, "db": config.db })
            });
            Json(json!({
                "available": available,
                "lastChecked": checked_at.to_rfc3339(),
                "error": error,
                "config": config,
            }))
            .into_response()
        }
        Err(e) => {
            log::warn!("cannot check sign-up availability: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "available": false,
                    "error": "Odoo is not configured",
                    "lastChecked": DateTime::now().to_rfc3339(),
                })),
            )
                .into_response()
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "ACCESS_DENIED"]
        #[status = FORBIDDEN]
        #[message = "Access denied"]
        AccessDenied,

        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Invalid email address"]
        InvalidEmail,

        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Invalid name"]
        InvalidName,

        #[code = "INVALID_USERNAME"]
        #[status = BAD_REQUEST]
        #[message = "Invalid username"]
        InvalidUsername,

        #[code = "MISSING_CREDENTIALS"]
        #[status = BAD_REQUEST]
        #[message = "Username and password are required"]
        MissingCredentials,

        #[code = "MISSING_CRITERIA"]
        #[status = BAD_REQUEST]
        #[message = "Either email or username is required"]
        MissingCriteria,

        #[code = "MISSING_FIELDS"]
        #[status = BAD_REQUEST]
        #[message = "All fields are required"]
        MissingFields,

        #[code = "NOT_CONFIGURED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Odoo is not configured"]
        NotConfigured,

        #[code = "PASSWORD_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Passwords do not match"]
        PasswordMismatch,

        #[code = "PASSWORD_TOO_SHORT"]
        #[status = BAD_REQUEST]
        #[message = "Password must be at least 8 characters long"]
        PasswordTooShort,

        #[code = "USER_EXISTS"]
        #[status = CONFLICT]
        #[message = "User with this email already exists"]
        UserExists,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid username or password"]
        WrongCredentials,
    }
}

impl AsError for authority::Error {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Denied => Some(AuthError::AccessDenied.into()),
            Self::Conflict => Some(AuthError::UserExists.into()),
            Self::Rejected(message) => Some(Error {
                code: "REJECTED",
                status_code: StatusCode::BAD_REQUEST,
                message: message.clone(),
                backtrace: None,
            }),
            Self::NotFound | Self::Server { .. } | Self::Odoo(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Authority(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::NotConfigured => Some(AuthError::NotConfigured.into()),
            Self::WrongCredentials => Some(AuthError::WrongCredentials.into()),
        }
    }
}

impl AsError for command::register_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Authority(e) => e.try_as_error(),
            Self::NotConfigured => Some(AuthError::NotConfigured.into()),
            Self::PasswordMismatch => Some(AuthError::PasswordMismatch.into()),
            Self::PasswordTooShort => Some(AuthError::PasswordTooShort.into()),
        }
    }
}

impl AsError for query::check_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Authority(e) => e.try_as_error(),
            Self::NoCriteria => Some(AuthError::MissingCriteria.into()),
            Self::NotConfigured => Some(AuthError::NotConfigured.into()),
        }
    }
}
