//! Capsule lookup flow.
//!
//! [`CapsuleViewer::open`] validates a code, fetches the capsule and
//! projects it onto a [`CapsuleDisplay`]. A sealed capsule gets a
//! [`CountdownTicker`]; [`CapsuleScreen::next`] follows it and, the first
//! time it observes the capsule unsealed, fetches the capsule once more to
//! pick up the content the backend withheld while it was sealed.

use std::time::Duration;

use tracing::{debug, info, instrument};

use time_capsule_core::{Capsule, CapsuleBody, CapsuleCode, CapsuleDisplay, Disclosure};

use crate::countdown::{CountdownHandle, CountdownTicker};
use crate::error::ClientError;
use crate::gateway::HttpGateway;

/// Opens capsule screens.
#[derive(Debug, Clone)]
pub struct CapsuleViewer {
    gateway: HttpGateway,
    tick: Duration,
}

impl CapsuleViewer {
    /// Create a viewer re-evaluating sealed capsules every `tick`.
    #[must_use]
    pub const fn new(gateway: HttpGateway, tick: Duration) -> Self {
        Self { gateway, tick }
    }

    /// Look up a capsule by the code the user typed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidFormat`] without sending anything if the
    /// code is malformed, [`ClientError::InvalidTimestamp`] if the capsule's
    /// open time does not parse, otherwise any gateway error.
    #[instrument(skip(self))]
    pub async fn open(&self, code: &str) -> Result<CapsuleScreen, ClientError> {
        let code = CapsuleCode::parse(code)?;
        let capsule = self.gateway.get_capsule(&code).await?;

        let mut screen = CapsuleScreen {
            gateway: self.gateway.clone(),
            tick: self.tick,
            display: CapsuleDisplay::project(&capsule, self.gateway.clock().now())?,
            code,
            capsule,
            ticker: None,
        };

        if screen.display.is_sealed() {
            screen.start_ticker();
        } else if screen.display.body == CapsuleBody::Withheld {
            // Opened between the backend's check and ours.
            screen.refresh().await?;
        }
        Ok(screen)
    }
}

/// One open capsule and its countdown.
#[derive(Debug)]
pub struct CapsuleScreen {
    gateway: HttpGateway,
    tick: Duration,
    code: CapsuleCode,
    capsule: Capsule,
    display: CapsuleDisplay,
    ticker: Option<CountdownHandle>,
}

impl CapsuleScreen {
    fn start_ticker(&mut self) {
        let open_time = self.display.open_time;
        self.ticker = Some(CountdownTicker::spawn(
            open_time,
            self.gateway.clock().clone(),
            self.tick,
        ));
    }

    #[must_use]
    pub const fn code(&self) -> &CapsuleCode {
        &self.code
    }

    /// The capsule as last fetched.
    #[must_use]
    pub const fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    /// What the screen shows right now.
    #[must_use]
    pub const fn display(&self) -> &CapsuleDisplay {
        &self.display
    }

    /// Whether a countdown is still running.
    #[must_use]
    pub const fn is_counting_down(&self) -> bool {
        self.ticker.is_some()
    }

    /// Wait for the next tick and update the display.
    ///
    /// Returns `Ok(None)` when nothing further will change. On the first
    /// unsealed tick the capsule is fetched again, exactly once.
    ///
    /// # Errors
    ///
    /// Returns any error from the follow-up fetch. The countdown is over by
    /// then; [`Self::refresh`] can retry.
    pub async fn next(&mut self) -> Result<Option<&CapsuleDisplay>, ClientError> {
        let Some(ticker) = self.ticker.as_mut() else {
            return Ok(None);
        };

        match ticker.next().await {
            Some(Disclosure::Sealed { remaining }) => {
                self.display.body = CapsuleBody::Countdown(remaining);
                Ok(Some(&self.display))
            }
            Some(Disclosure::Unsealed) => {
                self.ticker = None;
                info!(code = %self.code, "Capsule unsealed");
                self.refresh().await?;
                Ok(Some(&self.display))
            }
            None => {
                self.ticker = None;
                Ok(None)
            }
        }
    }

    /// Follow the countdown until the capsule opens.
    ///
    /// # Errors
    ///
    /// Returns any error from the follow-up fetch.
    pub async fn wait_open(&mut self) -> Result<&CapsuleDisplay, ClientError> {
        while self.next().await?.is_some() {}
        Ok(&self.display)
    }

    /// Fetch the capsule again and re-project it.
    ///
    /// # Errors
    ///
    /// Returns any gateway error, or [`ClientError::InvalidTimestamp`] if the
    /// refreshed open time does not parse. The previous display is kept.
    #[instrument(skip(self), fields(code = %self.code))]
    pub async fn refresh(&mut self) -> Result<&CapsuleDisplay, ClientError> {
        let capsule = self.gateway.get_capsule(&self.code).await?;
        let display = CapsuleDisplay::project(&capsule, self.gateway.clock().now())?;
        let sealed = display.is_sealed();
        debug!(sealed, "Refreshed capsule");

        self.capsule = capsule;
        self.display = display;
        if sealed && self.ticker.is_none() {
            self.start_ticker();
        }
        Ok(&self.display)
    }
}
