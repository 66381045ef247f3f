//! What a capsule screen may show right now.
//!
//! [`CapsuleDisplay::project`] is the only sanctioned way to get at a
//! capsule's content for display: it consults the disclosure gate first and
//! never lets content through while sealed, whatever the payload carries.

use chrono::{DateTime, Utc};

use crate::disclosure::{Countdown, Disclosure, DisclosureError};
use crate::types::{Capsule, CapsuleCode};

/// The body of a capsule screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapsuleBody {
    /// Still sealed; show the countdown.
    Countdown(Countdown),
    /// Open, and the payload carried the content.
    Content(String),
    /// Open by the clock, but the payload had no content (fetched while
    /// sealed). Re-fetch before showing anything.
    Withheld,
}

/// Everything a capsule screen renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleDisplay {
    pub code: Option<CapsuleCode>,
    pub title: String,
    pub author: String,
    pub created_at: Option<String>,
    pub open_time: DateTime<Utc>,
    pub body: CapsuleBody,
}

impl CapsuleDisplay {
    /// Project `capsule` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`DisclosureError::InvalidTimestamp`] if the open time does
    /// not parse; the capsule is then inaccessible.
    pub fn project(capsule: &Capsule, now: DateTime<Utc>) -> Result<Self, DisclosureError> {
        let open_time = capsule.open_time()?;
        let body = match crate::disclosure::evaluate_at(open_time, now) {
            Disclosure::Sealed { remaining } => CapsuleBody::Countdown(remaining),
            Disclosure::Unsealed => capsule
                .content
                .clone()
                .map_or(CapsuleBody::Withheld, CapsuleBody::Content),
        };

        Ok(Self {
            code: capsule.code.clone(),
            title: capsule.title.clone(),
            author: capsule.display_author().to_owned(),
            created_at: capsule.created_at.clone(),
            open_time,
            body,
        })
    }

    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        matches!(self.body, CapsuleBody::Countdown(_))
    }

    /// The content, if it may be shown.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            CapsuleBody::Content(text) => Some(text),
            CapsuleBody::Countdown(_) | CapsuleBody::Withheld => None,
        }
    }

    /// The countdown, if sealed.
    #[must_use]
    pub const fn countdown(&self) -> Option<&Countdown> {
        match &self.body {
            CapsuleBody::Countdown(countdown) => Some(countdown),
            CapsuleBody::Content(_) | CapsuleBody::Withheld => None,
        }
    }
}
