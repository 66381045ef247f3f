//! Reacting to session loss.
//!
//! The gateway never navigates. It raises [`AuthSignal`]s, and the
//! [`NavigationCoordinator`] owned by the host turns them into calls on the
//! host's [`Navigator`].

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{info, warn};

use time_capsule_core::Route;

use crate::gateway::{AuthSignal, HttpGateway};

/// The host's router.
pub trait Navigator: Send {
    fn navigate(&mut self, route: Route);
}

impl<F: FnMut(Route) + Send> Navigator for F {
    fn navigate(&mut self, route: Route) {
        self(route);
    }
}

/// Routes gateway auth signals to a [`Navigator`].
#[derive(Debug)]
pub struct NavigationCoordinator<N> {
    navigator: N,
    signals: broadcast::Receiver<AuthSignal>,
}

impl<N: Navigator> NavigationCoordinator<N> {
    /// Subscribe to `gateway`. Signals raised before this call are not seen.
    pub fn new(gateway: &HttpGateway, navigator: N) -> Self {
        Self {
            navigator,
            signals: gateway.subscribe(),
        }
    }

    fn handle(&mut self, signal: AuthSignal) {
        match signal {
            AuthSignal::Unauthorized => {
                info!(route = %Route::LOGIN, "Session lost, returning to login");
                self.navigator.navigate(Route::LOGIN);
            }
        }
    }

    /// Navigate once for a lagged receiver and discard whatever is still
    /// queued behind the gap.
    fn recover_from_lag(&mut self, missed: u64) {
        let mut skipped = 0_usize;
        while self.signals.try_recv().is_ok() {
            skipped += 1;
        }
        warn!(missed, skipped, "Auth signals dropped, navigating once");
        self.handle(AuthSignal::Unauthorized);
    }

    /// Handle every pending signal without waiting. Returns how many
    /// navigations were made.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.signals.try_recv() {
                Ok(signal) => self.handle(signal),
                Err(TryRecvError::Lagged(missed)) => self.recover_from_lag(missed),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return handled,
            }
            handled += 1;
        }
    }

    /// Handle signals until every gateway handle is dropped, then give the
    /// navigator back.
    pub async fn run(mut self) -> N {
        loop {
            match self.signals.recv().await {
                Ok(signal) => self.handle(signal),
                Err(RecvError::Lagged(missed)) => self.recover_from_lag(missed),
                Err(RecvError::Closed) => return self.navigator,
            }
        }
    }

    #[must_use]
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn into_navigator(self) -> N {
        self.navigator
    }
}
