//! Backend self-description endpoints.

use reqwest::Method;
use tracing::instrument;

use time_capsule_core::{AboutInfo, HealthStatus};

use super::{Credentials, HttpGateway};
use crate::error::ClientError;

impl HttpGateway {
    /// `GET /about`.
    ///
    /// # Errors
    ///
    /// Returns any gateway error.
    #[instrument(skip(self))]
    pub async fn about(&self) -> Result<AboutInfo, ClientError> {
        let url = self.endpoint("about")?;
        self.execute(Method::GET, url, None, Credentials::Anonymous)
            .await
    }

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns any gateway error. A reachable but degraded backend is an
    /// `Ok` whose [`HealthStatus::is_up`] is false.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.endpoint("health")?;
        self.execute(Method::GET, url, None, Credentials::Anonymous)
            .await
    }
}
