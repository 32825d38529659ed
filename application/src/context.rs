//! [`Context`]-related definitions.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts};
use service::domain::route::Routes;

use crate::{config::Environment, Error, Service};

/// Application context shared by all the requests.
#[derive(Clone, Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`Routes`] classification applied by the gate.
    routes: Arc<Routes>,

    /// [`Environment`] the application runs in.
    environment: Environment,
}

impl Context {
    /// Creates a new [`Context`] out of the provided parameters.
    #[must_use]
    pub fn new(service: Service, routes: Routes, environment: Environment) -> Self {
        Self {
            service,
            routes: Arc::new(routes),
            environment,
        }
    }

    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns [`Routes`] of this [`Context`].
    #[must_use]
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Returns [`Environment`] of this [`Context`].
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Context` extension"))
    }
}
