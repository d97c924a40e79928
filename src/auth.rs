//! Login flow for the stats dashboard.
//!
//! The flow is an explicit state machine. Each call to
//! [`SessionAuthenticator::step`] performs one transition:
//!
//! ```text
//! Unauthenticated → LoginPromptShown → CredentialsEntered → PasswordEntered
//!   → SubmittingCredentials → PostLoginLanding ─┬─────────────────────────→ Authenticated
//!                                               └→ RecoveryPromptShown → RecoveryCompleted ─┘
//! ```
//!
//! Errors in the mandatory credential steps move the machine to `Failed`
//! and end the invocation. The home-page probe and the recovery prompt are
//! best effort: a miss or an error there is logged and the flow continues.
//! Every path waits one settle delay before reaching `Authenticated`.

use futures::future::try_join;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Credentials, LoginTimings};
use crate::error::{ExportError, Result};
use crate::page::PageContext;
use crate::utils::mask_identity;

/// Identity-provider login button on the sign-in page.
pub const IDP_LOGIN_BUTTON: &str = ".button--withChrome.button--large";
pub const IDENTIFIER_INPUT: &str = "#identifierId";
pub const IDENTIFIER_NEXT: &str = "#identifierNext";
pub const PASSWORD_INPUT: &str = r#"#password input[type="password"]"#;
pub const PASSWORD_NEXT: &str = "#passwordNext";
/// First text input of the identity verification prompt.
pub const RECOVERY_INPUT: &str = "input";

/// Body text present once the home page has rendered.
pub const HOME_MARKER: &str = "HOME";
/// Body text of the identity verification interstitial.
pub const VERIFY_MARKER: &str = "Verify it's you";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    LoginPromptShown,
    CredentialsEntered,
    PasswordEntered,
    SubmittingCredentials,
    PostLoginLanding { home_detected: bool },
    RecoveryPromptShown,
    RecoveryCompleted,
    Authenticated,
    Failed,
}

impl LoginState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginState::Authenticated | LoginState::Failed)
    }
}

/// Transition guard out of the post-login landing page.
pub fn after_landing(body_text: &str) -> LoginState {
    if body_text.contains(VERIFY_MARKER) {
        LoginState::RecoveryPromptShown
    } else {
        LoginState::Authenticated
    }
}

/// What happened with the recovery interstitial.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecoveryOutcome {
    #[default]
    NotShown,
    Completed,
    /// The prompt was shown but handling it failed; the flow went on.
    Failed(String),
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub home_detected: bool,
    pub recovery: RecoveryOutcome,
    /// States visited, in order, ending with `Authenticated`.
    pub trace: Vec<LoginState>,
}

pub struct SessionAuthenticator<'a> {
    credentials: &'a Credentials,
    signin_url: &'a str,
    timings: &'a LoginTimings,
}

impl<'a> SessionAuthenticator<'a> {
    pub fn new(credentials: &'a Credentials, signin_url: &'a str, timings: &'a LoginTimings) -> Self {
        Self {
            credentials,
            signin_url,
            timings,
        }
    }

    /// Drive the state machine from `Unauthenticated` to `Authenticated`.
    ///
    /// # Errors
    ///
    /// The error of the first mandatory step that failed, typically
    /// [`ExportError::NavigationTimeout`].
    #[instrument(level = "info", skip_all, fields(user = %mask_identity(&self.credentials.username)))]
    pub async fn authenticate<P: PageContext>(&self, page: &P) -> Result<Authenticated> {
        let mut state = LoginState::Unauthenticated;
        let mut home_detected = false;
        let mut recovery = RecoveryOutcome::NotShown;
        let mut trace = vec![state.clone()];

        while !state.is_terminal() {
            let next = match self.step(page, &state, &mut recovery).await {
                Ok(next) => next,
                Err(e) => {
                    let from = std::mem::replace(&mut state, LoginState::Failed);
                    error!(?from, to = ?state, error = %e, "Login failed");
                    return Err(e);
                }
            };
            if let LoginState::PostLoginLanding { home_detected: seen } = next {
                home_detected = seen;
            }
            debug!(from = ?state, to = ?next, "Login transition");
            trace.push(next.clone());
            state = next;
        }

        info!(home_detected, ?recovery, "Authenticated");
        Ok(Authenticated {
            home_detected,
            recovery,
            trace,
        })
    }

    /// Perform the transition out of `state`.
    pub async fn step<P: PageContext>(
        &self,
        page: &P,
        state: &LoginState,
        recovery: &mut RecoveryOutcome,
    ) -> Result<LoginState> {
        let t = self.timings;
        match state {
            LoginState::Unauthenticated => {
                page.navigate(self.signin_url).await?;
                info!("Clicking identity provider login");
                let button = page.wait_for(IDP_LOGIN_BUTTON, t.element_timeout, false).await?;
                page.click(&button).await?;
                page.wait_for(IDENTIFIER_INPUT, t.element_timeout, false).await?;
                Ok(LoginState::LoginPromptShown)
            }
            LoginState::LoginPromptShown => {
                info!("Typing username");
                let input = page.wait_for(IDENTIFIER_INPUT, t.element_timeout, false).await?;
                page.type_text(&input, &self.credentials.username, None).await?;
                let next = page.wait_for(IDENTIFIER_NEXT, t.element_timeout, false).await?;
                page.click(&next).await?;
                info!("Waiting for password field");
                page.wait_for(PASSWORD_INPUT, t.element_timeout, true).await?;
                Ok(LoginState::CredentialsEntered)
            }
            LoginState::CredentialsEntered => {
                info!("Typing password");
                let input = page.wait_for(PASSWORD_INPUT, t.element_timeout, true).await?;
                page.type_text(&input, &self.credentials.password, Some(t.keystroke_delay))
                    .await?;
                Ok(LoginState::PasswordEntered)
            }
            LoginState::PasswordEntered => {
                info!("Submitting credentials");
                let submit = page.wait_for(PASSWORD_NEXT, t.element_timeout, false).await?;
                try_join(
                    page.wait_for_navigation(t.navigation_timeout),
                    page.click(&submit),
                )
                .await?;
                Ok(LoginState::SubmittingCredentials)
            }
            LoginState::SubmittingCredentials => {
                sleep(t.settle_delay).await;
                let probe =
                    wait_for_text(page, HOME_MARKER, t.home_probe_timeout, t.probe_interval).await;
                let home_detected = match probe {
                    Ok(true) => {
                        info!("Home page loaded");
                        true
                    }
                    Ok(false) => {
                        warn!(marker = HOME_MARKER, "Home page has not loaded");
                        false
                    }
                    Err(e) => {
                        warn!(error = %e, "Home page probe failed");
                        false
                    }
                };
                Ok(LoginState::PostLoginLanding { home_detected })
            }
            LoginState::PostLoginLanding { .. } => match page.body_text().await {
                Ok(body) => {
                    let next = after_landing(&body);
                    if next == LoginState::RecoveryPromptShown {
                        info!("Identity verification prompt detected");
                    } else {
                        info!("Identity verification prompt not detected");
                        sleep(t.settle_delay).await;
                    }
                    Ok(next)
                }
                Err(e) => {
                    let e = ExportError::RecoveryFlow(e.to_string());
                    warn!(error = %e, "Could not probe for identity verification prompt");
                    sleep(t.settle_delay).await;
                    Ok(LoginState::Authenticated)
                }
            },
            LoginState::RecoveryPromptShown => {
                *recovery = match self.complete_recovery(page).await {
                    Ok(()) => RecoveryOutcome::Completed,
                    Err(e) => {
                        warn!(error = %e, "Recovery prompt handling failed; continuing");
                        RecoveryOutcome::Failed(e.to_string())
                    }
                };
                Ok(LoginState::RecoveryCompleted)
            }
            LoginState::RecoveryCompleted => {
                sleep(t.settle_delay).await;
                Ok(LoginState::Authenticated)
            }
            LoginState::Authenticated | LoginState::Failed => Ok(state.clone()),
        }
    }

    async fn complete_recovery<P: PageContext>(&self, page: &P) -> Result<()> {
        let input = page
            .find_first(RECOVERY_INPUT)
            .await
            .map_err(|e| ExportError::RecoveryFlow(e.to_string()))?
            .ok_or_else(|| ExportError::RecoveryFlow("no input on verification prompt".into()))?;
        page.type_text(&input, &self.credentials.recovery_email, None)
            .await
            .map_err(|e| ExportError::RecoveryFlow(e.to_string()))?;
        page.press_enter(&input)
            .await
            .map_err(|e| ExportError::RecoveryFlow(e.to_string()))?;
        info!("Recovery email submitted");
        sleep(self.timings.settle_delay).await;
        Ok(())
    }
}

/// Poll the body text until it contains `marker`, for at most `timeout`.
async fn wait_for_text<P: PageContext>(
    page: &P,
    marker: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<bool> {
    let started = Instant::now();
    loop {
        if page.body_text().await?.contains(marker) {
            return Ok(true);
        }
        if started.elapsed() >= timeout {
            return Ok(false);
        }
        sleep(interval).await;
    }
}
