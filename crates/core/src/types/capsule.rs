//! Capsule models as they travel over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::code::CapsuleCode;
use crate::disclosure::{self, Disclosure, DisclosureError};

/// Shown in place of an author when none was given.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// A capsule as returned by `GET /capsules/{code}` or in the admin listing.
///
/// `open_time` and `created_at` are kept in wire form. A malformed open time
/// surfaces as [`DisclosureError::InvalidTimestamp`] when the capsule is
/// evaluated, not as a deserialisation failure, so the caller can show
/// "inaccessible" instead of "not found".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capsule {
    /// Backend-assigned code. The public lookup endpoint may omit it.
    #[serde(default, rename = "capsuleCode", alias = "code", skip_serializing_if = "Option::is_none")]
    pub code: Option<CapsuleCode>,
    pub title: String,
    /// May be absent or redacted while sealed. Never display this directly;
    /// go through [`crate::CapsuleDisplay`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, rename = "creatorNickname", alias = "author", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub open_time: String,
    #[serde(default, alias = "createTime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Capsule {
    /// The author to display, falling back to [`ANONYMOUS_AUTHOR`].
    #[must_use]
    pub fn display_author(&self) -> &str {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
    }

    /// Parse the open time.
    ///
    /// # Errors
    ///
    /// Returns [`DisclosureError::InvalidTimestamp`] if it does not parse.
    pub fn open_time(&self) -> Result<DateTime<Utc>, DisclosureError> {
        disclosure::parse_timestamp(&self.open_time)
    }

    /// Evaluate the disclosure state at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`DisclosureError::InvalidTimestamp`] if the open time does
    /// not parse.
    pub fn disclosure(&self, now: DateTime<Utc>) -> Result<Disclosure, DisclosureError> {
        disclosure::evaluate(&self.open_time, now)
    }

    /// Whether the title or code contains `needle_lowercase`.
    ///
    /// The needle must already be lowercased.
    #[must_use]
    pub fn matches_keyword(&self, needle_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(needle_lowercase)
            || self
                .code
                .as_ref()
                .is_some_and(|code| code.as_str().to_lowercase().contains(needle_lowercase))
    }
}

/// Response to `POST /capsules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCapsule {
    pub capsule_code: CapsuleCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
}
