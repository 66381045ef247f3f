//! Public capsule endpoints.

use reqwest::Method;
use tracing::{info, instrument};

use time_capsule_core::{Capsule, CapsuleCode, CapsuleDraft, CreatedCapsule};

use super::{Credentials, HttpGateway};
use crate::error::ClientError;

impl HttpGateway {
    /// Seal a new capsule.
    ///
    /// The draft is validated against the gateway's clock first; nothing is
    /// sent if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidDraft`] for form errors, otherwise any
    /// gateway error.
    #[instrument(skip(self, draft))]
    pub async fn create_capsule(&self, draft: CapsuleDraft) -> Result<CreatedCapsule, ClientError> {
        let draft = draft.normalized();
        draft.validate(self.inner.clock.now())?;

        let url = self.endpoint("capsules")?;
        let created: CreatedCapsule = self
            .execute(
                Method::POST,
                url,
                Some(serde_json::to_value(&draft)?),
                Credentials::Session,
            )
            .await?;

        info!(code = %created.capsule_code, "Capsule sealed");
        Ok(created)
    }

    /// Fetch a capsule by code.
    ///
    /// The backend may omit `content` while the capsule is sealed; use
    /// [`time_capsule_core::CapsuleDisplay::project`] to decide what may be
    /// shown.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for unknown codes, otherwise any
    /// gateway error.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn get_capsule(&self, code: &CapsuleCode) -> Result<Capsule, ClientError> {
        let url = self.endpoint(&format!("capsules/{code}"))?;
        self.execute(Method::GET, url, None, Credentials::Session)
            .await
    }
}
