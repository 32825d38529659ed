//! Route classification definitions.

use std::{str::FromStr, sync::LazyLock};

use common::define_kind;
use derive_more::{Display, Error};
use regex::Regex;

define_kind! {
    #[doc = "Access level required by a route."]
    enum Access {
        #[doc = "Route is reachable without a session."]
        Public = 1,

        #[doc = "Route requires a valid session."]
        Protected = 2,
    }
}

/// Path pattern of a route.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Pattern {
    /// Pattern written without a trailing `/*`.
    #[display("{_0}")]
    Exact(String),

    /// Pattern written as `<base>/*`, matching the base path itself and any
    /// of its sub-paths.
    #[display("{_0}/*")]
    Prefix(String),
}

impl Pattern {
    /// Checks whether this [`Pattern`] matches the `path` in a public list.
    ///
    /// [`Pattern::Exact`] matches the exact path only.
    #[must_use]
    pub fn matches_public(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(base) => is_within(path, base),
        }
    }

    /// Checks whether this [`Pattern`] matches the `path` in a protected
    /// list.
    ///
    /// Unlike [`Pattern::matches_public()`], [`Pattern::Exact`] also matches
    /// the sub-paths of the exact path.
    #[must_use]
    pub fn matches_protected(&self, path: &str) -> bool {
        match self {
            Self::Exact(base) | Self::Prefix(base) => is_within(path, base),
        }
    }
}

impl FromStr for Pattern {
    type Err = InvalidPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('/') {
            return Err(InvalidPattern(s.to_owned()));
        }
        Ok(s.strip_suffix("/*").map_or_else(
            || Self::Exact(s.to_owned()),
            |base| Self::Prefix(base.to_owned()),
        ))
    }
}

/// Error of parsing a [`Pattern`].
#[derive(Clone, Debug, Display, Error)]
#[display("`{_0}` is not an absolute route pattern")]
pub struct InvalidPattern(#[error(not(source))] String);

/// Checks whether the `path` is the `base` path or any of its sub-paths.
fn is_within(path: &str, base: &str) -> bool {
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Static classification of routes into [`Access`] levels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Routes {
    /// [`Pattern`]s of [`Access::Public`] routes.
    public: Vec<Pattern>,

    /// [`Pattern`]s of [`Access::Protected`] routes.
    protected: Vec<Pattern>,

    /// [`Access`] of the routes matched by neither list.
    fallback: Access,
}

impl Routes {
    /// Default [`Access::Public`] route patterns.
    pub const DEFAULT_PUBLIC: &'static [&'static str] = &[
        "/",
        "/login",
        "/register",
        "/setup",
        "/api/auth/*",
        "/api/health/*",
    ];

    /// Default [`Access::Protected`] route patterns.
    pub const DEFAULT_PROTECTED: &'static [&'static str] =
        &["/dashboard/*", "/profile/*", "/settings/*", "/admin/*"];

    /// Creates new [`Routes`] out of the provided parameters.
    #[must_use]
    pub fn new(
        public: impl IntoIterator<Item = Pattern>,
        protected: impl IntoIterator<Item = Pattern>,
        fallback: Access,
    ) -> Self {
        Self {
            public: public.into_iter().collect(),
            protected: protected.into_iter().collect(),
            fallback,
        }
    }

    /// Parses new [`Routes`] out of the provided string patterns.
    ///
    /// # Errors
    ///
    /// Errors if any of the patterns is not an absolute path.
    pub fn parse<P: AsRef<str>>(
        public: impl IntoIterator<Item = P>,
        protected: impl IntoIterator<Item = P>,
        fallback: Access,
    ) -> Result<Self, InvalidPattern> {
        Ok(Self::new(
            public
                .into_iter()
                .map(|p| p.as_ref().parse())
                .collect::<Result<Vec<_>, _>>()?,
            protected
                .into_iter()
                .map(|p| p.as_ref().parse())
                .collect::<Result<Vec<_>, _>>()?,
            fallback,
        ))
    }

    /// Classifies the provided `path`.
    ///
    /// A match in the public list always wins, then the protected list is
    /// consulted, and the fallback [`Access`] applies to everything else.
    #[must_use]
    pub fn classify(&self, path: &str) -> Access {
        if self.public.iter().any(|p| p.matches_public(path)) {
            Access::Public
        } else if self.protected.iter().any(|p| p.matches_protected(path)) {
            Access::Protected
        } else {
            self.fallback
        }
    }

    /// Checks whether the provided `path` points to a static asset, which is
    /// never gated.
    #[must_use]
    pub fn is_asset(path: &str) -> bool {
        /// Regular expression matching static asset paths.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"^/(?:_next/static|_next/image|favicon\.ico|.*\.(?:svg|png|jpg|jpeg|gif|webp)$)",
            )
            .expect("valid regex")
        });

        REGEX.is_match(path)
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::parse(
            Self::DEFAULT_PUBLIC.iter(),
            Self::DEFAULT_PROTECTED.iter(),
            Access::Protected,
        )
        .unwrap_or_else(|e| unreachable!("default patterns are valid: {e}"))
    }
}

#[cfg(test)]
mod spec {
    use super::{Access, Pattern, Routes};

    fn routes(public: &[&str], protected: &[&str], fallback: Access) -> Routes {
        Routes::parse(public, protected, fallback).unwrap()
    }

    #[test]
    fn parses_patterns() {
        assert_eq!(
            "/dashboard/*".parse::<Pattern>().unwrap(),
            Pattern::Prefix("/dashboard".into()),
        );
        assert_eq!(
            "/login".parse::<Pattern>().unwrap(),
            Pattern::Exact("/login".into()),
        );
        assert_eq!(Pattern::Prefix("/api/auth".into()).to_string(), "/api/auth/*");
        assert!("dashboard".parse::<Pattern>().is_err());
    }

    #[test]
    fn public_exact_pattern_matches_only_itself() {
        let pattern = Pattern::Exact("/login".into());

        assert!(pattern.matches_public("/login"));
        assert!(!pattern.matches_public("/login/reset"));
        assert!(pattern.matches_protected("/login/reset"));
        assert!(!pattern.matches_protected("/loginx"));
    }

    #[test]
    fn prefix_pattern_matches_base_and_sub_paths() {
        let pattern = Pattern::Prefix("/dashboard".into());

        for path in ["/dashboard", "/dashboard/", "/dashboard/client/1"] {
            assert!(pattern.matches_public(path), "{path}");
            assert!(pattern.matches_protected(path), "{path}");
        }
        assert!(!pattern.matches_public("/dashboards"));
        assert!(!pattern.matches_protected("/dashboards"));
    }

    #[test]
    fn dashboard_root_is_protected_by_wildcard() {
        let routes = routes(&[], &["/dashboard/*"], Access::Public);

        assert_eq!(routes.classify("/dashboard"), Access::Protected);
        assert_eq!(routes.classify("/dashboard/optimized"), Access::Protected);
        assert_eq!(routes.classify("/about"), Access::Public);
    }

    #[test]
    fn login_is_always_public() {
        let routes =
            routes(&["/login"], &["/login", "/", "/*"], Access::Protected);

        assert_eq!(routes.classify("/login"), Access::Public);
        assert_eq!(routes.classify("/login/reset"), Access::Protected);
    }

    #[test]
    fn fallback_applies_to_unlisted_paths() {
        let routes = Routes::default();

        assert_eq!(routes.classify("/"), Access::Public);
        assert_eq!(routes.classify("/api/auth/login"), Access::Public);
        assert_eq!(routes.classify("/api/health"), Access::Public);
        assert_eq!(routes.classify("/settings"), Access::Protected);
        assert_eq!(routes.classify("/reports"), Access::Protected);
        assert_eq!(Access::Protected.to_string(), "PROTECTED");
        assert_eq!("public".parse::<Access>().unwrap(), Access::Public);
    }

    #[test]
    fn detects_static_assets() {
        for path in [
            "/_next/static/chunks/app.js",
            "/_next/image?url=x",
            "/favicon.ico",
            "/images/logo.svg",
            "/photo.JPG.png",
        ] {
            assert!(Routes::is_asset(path), "{path}");
        }
        for path in ["/dashboard", "/logo.svg/edit", "/api/auth/me"] {
            assert!(!Routes::is_asset(path), "{path}");
        }
    }
}
