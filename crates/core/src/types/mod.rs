//! Core types for the time capsule client.
//!
//! This module provides type-safe wrappers for the capsule domain.

pub mod capsule;
pub mod code;
pub mod credential;
pub mod draft;
pub mod page;
pub mod route;
pub mod system;
pub mod theme;

pub use capsule::{ANONYMOUS_AUTHOR, Capsule, CreatedCapsule};
pub use code::{CapsuleCode, CapsuleCodeError, CodeValidation, validate_code};
pub use credential::{AdminPassword, PasswordError};
pub use draft::{CapsuleDraft, DraftError, DraftErrors};
pub use page::{CapsuleSort, Page, Pagination};
pub use route::Route;
pub use system::{AboutInfo, HealthStatus};
pub use theme::Theme;
