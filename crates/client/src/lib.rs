//! Time Capsule Client - the stateful half of the time capsule client.
//!
//! Hosts (a terminal UI, a desktop shell, a test harness) build one
//! [`AppState`] at startup and drive everything through it:
//!
//! - [`SessionStore`] holds the admin bearer token and mirrors it to
//!   durable storage
//! - [`HttpGateway`] talks to the backend, unwraps envelopes and turns a
//!   rejected token into a logout plus an [`AuthSignal`]
//! - [`AdminRoster`] is the admin listing with its keyword filter
//! - [`CapsuleViewer`] runs the lookup flow, ticking a countdown while the
//!   capsule is sealed
//! - [`NavigationCoordinator`] turns auth signals into host navigation
//! - [`ThemePreference`] persists the light/dark choice
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! telemetry::init_tracing(&config)?;
//!
//! let state = AppState::init(config)?;
//! let mut screen = state.viewer().open("AB12CD34").await?;
//! let opened = screen.wait_open().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod countdown;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod roster;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod theme;
pub mod viewer;

pub use config::{ClientConfig, ConfigError};
pub use countdown::{CountdownHandle, CountdownTicker};
pub use error::ClientError;
pub use gateway::{AdminLogin, AuthSignal, HttpGateway};
pub use navigation::{NavigationCoordinator, Navigator};
pub use roster::{AdminRoster, Removal, filter_capsules};
pub use session::{Authenticator, SessionSnapshot, SessionStore};
pub use state::AppState;
pub use storage::{DurableStorage, FileStorage, MemoryStorage, StorageError};
pub use theme::ThemePreference;
pub use viewer::{CapsuleScreen, CapsuleViewer};
