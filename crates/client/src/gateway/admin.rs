//! Admin endpoints.
//!
//! Everything except `login` needs a bearer token; requests sent without one
//! are rejected by the backend with 401 and have no session side effect.

use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use time_capsule_core::{AdminPassword, Capsule, CapsuleCode, CapsuleSort, Page};

use super::{Credentials, HttpGateway};
use crate::error::ClientError;
use crate::session::Authenticator;

/// A successful admin login.
#[derive(Debug, Clone)]
pub struct AdminLogin {
    /// Bearer token for subsequent admin requests.
    pub token: SecretString,
    /// Token scheme reported by the backend, usually `Bearer`.
    pub token_type: Option<String>,
    /// Lifetime in seconds, if reported.
    pub expires_in: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JwtResponse {
    token: String,
    #[serde(default, rename = "type")]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl HttpGateway {
    /// `POST /admin/login`.
    ///
    /// Sent without any existing token, so a wrong password never disturbs
    /// the current session. Does not store the token; see
    /// [`crate::session::SessionStore::login`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] for a rejected password,
    /// otherwise any gateway error.
    #[instrument(skip_all)]
    pub async fn login(&self, password: &AdminPassword) -> Result<AdminLogin, ClientError> {
        let url = self.endpoint("admin/login")?;
        let body = serde_json::json!({ "password": password.expose() });
        let response: JwtResponse = self
            .execute(Method::POST, url, Some(body), Credentials::Anonymous)
            .await?;

        Ok(AdminLogin {
            token: SecretString::from(response.token),
            token_type: response.token_type,
            expires_in: response.expires_in,
        })
    }

    /// `GET /admin/capsules?page&size&sort`. Pages are 1-based.
    ///
    /// # Errors
    ///
    /// Returns any gateway error; 401 also clears the session.
    #[instrument(skip(self))]
    pub async fn list_capsules(
        &self,
        page: u32,
        size: u32,
        sort: CapsuleSort,
    ) -> Result<Page<Capsule>, ClientError> {
        let mut url = self.endpoint("admin/capsules")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string())
            .append_pair("sort", sort.as_query());

        self.execute(Method::GET, url, None, Credentials::Session)
            .await
    }

    /// `DELETE /admin/capsules/{code}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the capsule is already gone,
    /// otherwise any gateway error; 401 also clears the session.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn delete_capsule(&self, code: &CapsuleCode) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("admin/capsules/{code}"))?;
        let _: IgnoredAny = self
            .execute(Method::DELETE, url, None, Credentials::Session)
            .await?;

        info!(code = %code, "Capsule deleted");
        Ok(())
    }
}

impl Authenticator for HttpGateway {
    async fn authenticate(&self, password: &AdminPassword) -> Result<SecretString, ClientError> {
        self.login(password).await.map(|login| login.token)
    }
}
