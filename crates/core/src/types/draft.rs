//! The create-capsule request and its form rules.

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// A single rejected field of a [`CapsuleDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("title is required")]
    TitleMissing,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("content is required")]
    ContentMissing,
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
    #[error("author must be at most {max} characters")]
    AuthorTooLong { max: usize },
    #[error("open time must be in the future")]
    OpenTimeNotInFuture,
}

/// Every field-level problem found in a draft, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftErrors(Vec<DraftError>);

impl DraftErrors {
    /// The individual problems.
    #[must_use]
    pub fn errors(&self) -> &[DraftError] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `error` is among the problems.
    #[must_use]
    pub fn contains(&self, error: &DraftError) -> bool {
        self.0.contains(error)
    }
}

impl fmt::Display for DraftErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for DraftErrors {}

/// A capsule about to be created.
///
/// Serialises to the `POST /capsules` body:
/// `{title, content, openTime, creatorNickname}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleDraft {
    pub title: String,
    pub content: String,
    #[serde(serialize_with = "serialize_open_time")]
    pub open_time: DateTime<Utc>,
    #[serde(rename = "creatorNickname", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl CapsuleDraft {
    pub const TITLE_MAX_LENGTH: usize = 100;
    pub const CONTENT_MAX_LENGTH: usize = 1000;
    pub const AUTHOR_MAX_LENGTH: usize = 50;

    /// Check the draft against the form rules as of `now`.
    ///
    /// Lengths are counted in characters, not bytes. A blank author is
    /// dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns every violated rule at once.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DraftErrors> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(DraftError::TitleMissing);
        } else if self.title.chars().count() > Self::TITLE_MAX_LENGTH {
            errors.push(DraftError::TitleTooLong {
                max: Self::TITLE_MAX_LENGTH,
            });
        }

        if self.content.trim().is_empty() {
            errors.push(DraftError::ContentMissing);
        } else if self.content.chars().count() > Self::CONTENT_MAX_LENGTH {
            errors.push(DraftError::ContentTooLong {
                max: Self::CONTENT_MAX_LENGTH,
            });
        }

        if self
            .author
            .as_ref()
            .is_some_and(|author| author.chars().count() > Self::AUTHOR_MAX_LENGTH)
        {
            errors.push(DraftError::AuthorTooLong {
                max: Self::AUTHOR_MAX_LENGTH,
            });
        }

        if self.open_time <= now {
            errors.push(DraftError::OpenTimeNotInFuture);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DraftErrors(errors))
        }
    }

    /// Normalise optional fields: a blank author becomes `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.author.as_deref().is_some_and(|a| a.trim().is_empty()) {
            self.author = None;
        }
        self
    }
}

fn serialize_open_time<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn draft() -> CapsuleDraft {
        CapsuleDraft {
            title: "To future me".to_owned(),
            content: "Did it work out?".to_owned(),
            open_time: now() + TimeDelta::hours(1),
            author: Some("Ana".to_owned()),
        }
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate(now()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let bad = CapsuleDraft {
            title: "  ".to_owned(),
            content: String::new(),
            open_time: now(),
            author: Some("x".repeat(51)),
        };

        let errors = bad.validate(now()).unwrap_err();
        assert_eq!(
            errors.errors(),
            &[
                DraftError::TitleMissing,
                DraftError::ContentMissing,
                DraftError::AuthorTooLong { max: 50 },
                DraftError::OpenTimeNotInFuture,
            ]
        );
    }

    #[test]
    fn test_length_limits_count_characters() {
        let mut d = draft();
        d.title = "é".repeat(100);
        d.content = "字".repeat(1000);
        assert!(d.validate(now()).is_ok());

        d.title = "a".repeat(101);
        d.content = "a".repeat(1001);
        let errors = d.validate(now()).unwrap_err();
        assert!(errors.contains(&DraftError::TitleTooLong { max: 100 }));
        assert!(errors.contains(&DraftError::ContentTooLong { max: 1000 }));
    }

    #[test]
    fn test_open_time_must_be_strictly_future() {
        let mut d = draft();
        d.open_time = now() - TimeDelta::seconds(1);
        assert!(
            d.validate(now())
                .unwrap_err()
                .contains(&DraftError::OpenTimeNotInFuture)
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(draft()).unwrap();
        assert_eq!(
            body,
            json!({
                "title": "To future me",
                "content": "Did it work out?",
                "openTime": "2030-01-01T01:00:00Z",
                "creatorNickname": "Ana"
            })
        );
    }

    #[test]
    fn test_blank_author_is_dropped() {
        let mut d = draft();
        d.author = Some("  ".to_owned());
        let body = serde_json::to_value(d.normalized()).unwrap();
        assert!(body.get("creatorNickname").is_none());
    }
}
