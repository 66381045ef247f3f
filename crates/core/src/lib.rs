//! Time Capsule Core - Shared types and rules.
//!
//! This crate provides the pure half of the time capsule client:
//! - capsule codes, capsule models and the create-form rules
//! - the disclosure gate deciding whether content may be shown
//! - the countdown breakdown shown while a capsule is sealed
//! - clocks, themes and navigation routes
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no storage, no
//! HTTP clients. Everything that needs "now" takes it as an argument or
//! through a [`Clock`], so behaviour is deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and wire models
//! - [`disclosure`] - Sealed/unsealed evaluation and countdowns
//! - [`display`] - Projection of a capsule onto what a screen may show
//! - [`clock`] - System and manual time sources

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod disclosure;
pub mod display;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use disclosure::{Countdown, Disclosure, DisclosureError, DisclosureGate};
pub use display::{CapsuleBody, CapsuleDisplay};
pub use types::*;
