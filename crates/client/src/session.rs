//! Admin session state.
//!
//! The [`SessionStore`] owns the admin bearer token. It mirrors the token
//! into the [`ADMIN_TOKEN_SLOT`] durable slot so a restarted process comes
//! back logged in, and it never navigates: reacting to a lost session is the
//! [`crate::navigation::NavigationCoordinator`]'s job.
//!
//! # Generations
//!
//! Every token change bumps a generation counter. Work started under one
//! generation (an in-flight request, a loaded roster page) can compare it
//! later to find out that the session it belonged to is gone. The gateway's
//! 401 handling goes through [`SessionStore::invalidate`], which only clears
//! the session it was handed, so a burst of concurrent 401s logs out once.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument};

use time_capsule_core::AdminPassword;

use crate::error::ClientError;
use crate::storage::{ADMIN_TOKEN_SLOT, DurableStorage, StorageError};

/// Something that can trade the admin password for a bearer token.
///
/// Implemented by [`crate::gateway::HttpGateway`] (`POST /admin/login`).
pub trait Authenticator: Send + Sync {
    /// Exchange `password` for a bearer token.
    fn authenticate(
        &self,
        password: &AdminPassword,
    ) -> impl Future<Output = Result<SecretString, ClientError>> + Send;
}

/// A consistent view of the session at one instant.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// The bearer token, if authenticated.
    pub token: Option<SecretString>,
    /// Generation the token belongs to.
    pub generation: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Handle to the admin session. Clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn DurableStorage>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    generation: u64,
}

impl SessionState {
    fn replace(&mut self, token: Option<SecretString>) -> bool {
        let changed = match (&self.token, &token) {
            (None, None) => false,
            (Some(old), Some(new)) => old.expose_secret() != new.expose_secret(),
            _ => true,
        };
        if changed {
            self.token = token;
            self.generation += 1;
        }
        changed
    }
}

/// A stored value counts as a token only if it has non-whitespace content.
fn stored_token(raw: Option<String>) -> Option<SecretString> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| SecretString::from(value.trim().to_owned()))
}

impl SessionStore {
    /// Create a store, hydrating the token from durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be read.
    pub fn hydrate(storage: Arc<dyn DurableStorage>) -> Result<Self, StorageError> {
        let token = stored_token(storage.get(ADMIN_TOKEN_SLOT)?);
        debug!(authenticated = token.is_some(), "Hydrated admin session");

        Ok(Self {
            inner: Arc::new(SessionInner {
                storage,
                state: Mutex::new(SessionState {
                    token,
                    generation: 0,
                }),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().token.is_some()
    }

    /// The current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.state().token.clone()
    }

    /// The current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Token and generation read under one lock.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            token: state.token.clone(),
            generation: state.generation,
        }
    }

    /// Replace the token.
    ///
    /// `None` erases the durable copy; `Some` persists it. Storage is
    /// written first and memory only follows on success, so a failed write
    /// leaves the previous session intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be written.
    pub fn set_token(&self, token: Option<SecretString>) -> Result<(), StorageError> {
        let mut state = self.state();
        match &token {
            Some(token) => self
                .inner
                .storage
                .set(ADMIN_TOKEN_SLOT, token.expose_secret())?,
            None => self.inner.storage.remove(ADMIN_TOKEN_SLOT)?,
        }
        if state.replace(token) {
            debug!(generation = state.generation, "Admin session changed");
        }
        Ok(())
    }

    /// Re-read the token from durable storage and report whether one is
    /// present.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be read.
    pub fn check_auth(&self) -> Result<bool, StorageError> {
        let mut state = self.state();
        let token = stored_token(self.inner.storage.get(ADMIN_TOKEN_SLOT)?);
        state.replace(token);
        Ok(state.token.is_some())
    }

    /// Drop the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be erased.
    pub fn logout(&self) -> Result<(), StorageError> {
        info!("Admin logged out");
        self.set_token(None)
    }

    /// Clear the session if it is still at `generation` and holds a token.
    ///
    /// Returns `true` only for the call that actually cleared it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token slot cannot be erased; the session is
    /// then left as it was.
    pub fn invalidate(&self, generation: u64) -> Result<bool, StorageError> {
        let mut state = self.state();
        if state.generation != generation || state.token.is_none() {
            return Ok(false);
        }
        self.inner.storage.remove(ADMIN_TOKEN_SLOT)?;
        state.replace(None);
        Ok(true)
    }

    /// Log in with `password` and keep the returned token.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's error, or [`ClientError::Storage`] if
    /// the token cannot be persisted.
    #[instrument(skip_all)]
    pub async fn login<A: Authenticator>(
        &self,
        authenticator: &A,
        password: &AdminPassword,
    ) -> Result<SecretString, ClientError> {
        let token = authenticator.authenticate(password).await?;
        self.set_token(Some(token.clone()))?;
        info!("Admin logged in");
        Ok(token)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.token.is_some())
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}
