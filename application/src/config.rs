//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::Debug;
use http::{
    header::{self, InvalidHeaderValue},
    HeaderValue, Method,
};
use serde::Deserialize;
use service::{
    domain::route::{self, InvalidPattern},
    infra::odoo,
};
use smart_default::SmartDefault;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: Server,

    /// Session configuration.
    #[serde(default)]
    pub session: Session,

    /// Odoo configuration.
    #[serde(default)]
    pub odoo: Odoo,

    /// Routes configuration.
    #[serde(default)]
    pub routes: Routes,

    /// Log configuration.
    #[serde(default)]
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("CONF")
                    .separator(".")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.origins")
                    .with_list_parse_key("routes.public")
                    .with_list_parse_key("routes.protected")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(3000)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

impl Cors {
    /// Builds a [`CorsLayer`] allowing all the configured [`Cors::origins`].
    ///
    /// A `*` origin allows any origin.
    ///
    /// # Errors
    ///
    /// Errors if any of the [`Cors::origins`] is not a valid header value.
    pub fn layer(&self) -> Result<CorsLayer, InvalidHeaderValue> {
        let origins = if self.origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                self.origins
                    .iter()
                    .map(|o| o.parse::<HeaderValue>())
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };
        Ok(CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(origins))
    }
}

/// Session configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Session {
    /// Secret signing session tokens.
    #[debug(skip)]
    #[default(Session::DEFAULT_SECRET.to_owned())]
    pub secret: String,

    /// [`Environment`] the application runs in.
    pub environment: Environment,
}

impl Session {
    /// Secret used when none is configured.
    pub const DEFAULT_SECRET: &'static str =
        "default-dev-secret-change-in-production";
}

impl From<Session> for service::Config {
    fn from(value: Session) -> Self {
        Self::from_secret(value.secret)
    }
}

/// Environment the application runs in.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,

    /// Production deployment, served over HTTPS.
    Production,
}

/// Odoo configuration.
///
/// Odoo is considered not configured unless both [`Odoo::url`] and
/// [`Odoo::db`] are set.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Odoo {
    /// Base URL of the Odoo instance.
    pub url: Option<String>,

    /// Name of the Odoo database.
    pub db: Option<String>,

    /// Timeout of a single request to Odoo.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl Odoo {
    /// Converts this [`Odoo`] configuration into an [`odoo::Config`], if
    /// Odoo is configured.
    #[must_use]
    pub fn into_client_config(self) -> Option<odoo::Config> {
        let Self { url, db, timeout } = self;

        let url = url.filter(|u| !u.trim().is_empty())?;
        let db = db.filter(|d| !d.trim().is_empty())?;
        Some(odoo::Config { url, db, timeout })
    }
}

/// Routes configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Routes {
    /// Patterns of routes reachable without a session.
    #[default(owned(route::Routes::DEFAULT_PUBLIC))]
    pub public: Vec<String>,

    /// Patterns of routes requiring a session.
    #[default(owned(route::Routes::DEFAULT_PROTECTED))]
    pub protected: Vec<String>,

    /// Access of routes matched by neither list.
    pub fallback: Access,
}

impl TryFrom<Routes> for route::Routes {
    type Error = InvalidPattern;

    fn try_from(value: Routes) -> Result<Self, Self::Error> {
        let Routes {
            public,
            protected,
            fallback,
        } = value;
        Self::parse(public, protected, fallback.into())
    }
}

/// Converts the provided string slices into owned [`String`]s.
fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|&s| s.to_owned()).collect()
}

/// Access level of a route.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Access {
    /// Route is reachable without a session.
    Public,

    /// Route requires a session.
    #[default]
    Protected,
}

impl From<Access> for route::Access {
    fn from(value: Access) -> Self {
        match value {
            Access::Public => Self::Public,
            Access::Protected => Self::Protected,
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use axum::{body::Body, routing::get, Router};
    use http::{header, Request};
    use service::domain::route::Access;
    use tower::ServiceExt as _;

    use super::{Config, Cors, Environment, Odoo};

    async fn allowed_origin(cors: &Cors, origin: &str) -> Option<String> {
        let app = Router::new()
            .route("/", get(|| async { "" }))
            .layer(cors.layer().unwrap());
        let resp = app
            .oneshot(
                Request::get("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_owned())
    }

    #[test]
    fn defaults_leave_odoo_unconfigured() {
        let config = Config::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.environment, Environment::Development);
        assert!(config.odoo.into_client_config().is_none());

        let routes =
            service::domain::route::Routes::try_from(config.routes).unwrap();
        assert_eq!(routes, service::domain::route::Routes::default());
        assert_eq!(routes.classify("/reports"), Access::Protected);
    }

    #[test]
    fn requires_both_odoo_url_and_db() {
        let odoo = |url: &str, db: &str| Odoo {
            url: Some(url.to_owned()),
            db: Some(db.to_owned()),
            timeout: Duration::from_secs(5),
        };

        assert!(odoo("", "main").into_client_config().is_none());
        assert!(odoo("http://odoo:8069", " ").into_client_config().is_none());

        let config = odoo("http://odoo:8069", "main")
            .into_client_config()
            .unwrap();
        assert_eq!(config.url, "http://odoo:8069");
        assert_eq!(config.db, "main");
    }

    #[tokio::test]
    async fn allows_every_configured_origin() {
        let cors = Cors {
            origins: vec![
                "https://app.example.com".to_owned(),
                "https://admin.example.com".to_owned(),
            ],
        };

        assert_eq!(
            allowed_origin(&cors, "https://app.example.com").await.as_deref(),
            Some("https://app.example.com"),
        );
        assert_eq!(
            allowed_origin(&cors, "https://admin.example.com")
                .await
                .as_deref(),
            Some("https://admin.example.com"),
        );
        assert_eq!(
            allowed_origin(&cors, "https://evil.example.com").await,
            None,
        );
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        let cors = Cors::default();

        assert_eq!(
            allowed_origin(&cors, "https://anywhere.example.com")
                .await
                .as_deref(),
            Some("*"),
        );
    }

    #[test]
    fn rejects_invalid_origin() {
        let cors = Cors {
            origins: vec!["https://bad\norigin".to_owned()],
        };

        assert!(cors.layer().is_err());
    }
}
