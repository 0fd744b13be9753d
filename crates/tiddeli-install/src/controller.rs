//! Install prompt lifecycle and banner visibility.

use std::cell::{Cell, RefCell};

use serde::Serialize;
use tiddeli_core::{Clock, KeyValueStore};
use tiddeli_observability::StructuredLogger;

use crate::error::PromptError;
use crate::policy::BannerPolicy;
use crate::ui::{InstallOutcome, InstallPrompt, InstallUi};

/// Where an install click came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    /// The banner's Install button.
    Banner,
    /// The install button in the top bar.
    Top,
}

/// Install flow state for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallState {
    /// The platform has not offered an install prompt.
    NoPromptAvailable,
    /// A prompt is held and can be replayed.
    PromptDeferred,
    /// The user accepted the prompt.
    Accepted,
    /// The user dismissed the prompt.
    Dismissed,
    /// The prompt was lost (installed elsewhere, or the replay failed).
    Expired,
}

/// Owns the deferred install prompt and drives the install UI.
///
/// The platform may offer the prompt before the page is set up, so
/// [`capture`](Self::capture) can be called at any time; the UI is revealed
/// once [`setup`](Self::setup) has run.
pub struct InstallController<P, U, S, C> {
    policy: BannerPolicy<S, C>,
    ui: U,
    deferred: RefCell<Option<P>>,
    queued: Cell<bool>,
    ready: Cell<bool>,
    state: Cell<InstallState>,
    logger: StructuredLogger,
}

impl<P, U, S, C> InstallController<P, U, S, C>
where
    P: InstallPrompt,
    U: InstallUi,
    S: KeyValueStore,
    C: Clock,
{
    /// Create a controller with no prompt captured.
    pub fn new(policy: BannerPolicy<S, C>, ui: U) -> Self {
        Self {
            logger: StructuredLogger::new("install").with_version(policy.version()),
            policy,
            ui,
            deferred: RefCell::new(None),
            queued: Cell::new(false),
            ready: Cell::new(false),
            state: Cell::new(InstallState::NoPromptAvailable),
        }
    }

    /// Use a specific logger.
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger.child("install").with_version(self.policy.version());
        self
    }

    /// Current state.
    pub fn state(&self) -> InstallState {
        self.state.get()
    }

    /// Whether a prompt is held.
    pub fn has_deferred_prompt(&self) -> bool {
        self.deferred.borrow().is_some()
    }

    /// Whether a prompt arrived at some point during this page's life.
    pub fn is_queued(&self) -> bool {
        self.queued.get()
    }

    /// Banner policy.
    pub fn policy(&self) -> &BannerPolicy<S, C> {
        &self.policy
    }

    /// Hold a prompt offered by the platform (`beforeinstallprompt`).
    pub fn capture(&self, prompt: P) {
        *self.deferred.borrow_mut() = Some(prompt);
        self.queued.set(true);
        self.state.set(InstallState::PromptDeferred);
        self.logger.debug("Install prompt deferred");

        if self.ready.get() {
            self.reveal();
        }
    }

    /// Wire the UI. Shows the banner when allowed, with its Install button
    /// only if a prompt is already held.
    pub fn setup(&self) {
        self.ready.set(true);

        if self.queued.get() && self.has_deferred_prompt() {
            self.ui.show_top_button();
        }

        if self.ui.is_standalone() {
            self.logger.info("Banner not shown: running standalone");
            return;
        }

        let prefs = match self.policy.load() {
            Ok(prefs) => prefs,
            Err(err) => {
                self.logger
                    .warn_with("Failed to read banner preferences", &[("error", &err)]);
                Default::default()
            }
        };

        if self.banner_allowed() {
            self.ui.show_banner(self.has_deferred_prompt());
            let previous = prefs.last_version_seen.as_deref().unwrap_or("none");
            if previous != self.policy.version() {
                self.logger.info_with(
                    "Banner shown for new version",
                    &[("previous", &previous)],
                );
            } else {
                self.logger.info("Banner shown");
            }
        } else {
            self.logger
                .info_builder("Banner not shown")
                .field("last_seen", prefs.last_version_seen.unwrap_or_default())
                .field_bool("snoozed", prefs.snooze_until.is_some())
                .emit();
        }
    }

    fn banner_allowed(&self) -> bool {
        match self.policy.can_show_banner() {
            Ok(allowed) => allowed,
            Err(err) => {
                self.logger
                    .warn_with("Failed to read banner preferences", &[("error", &err)]);
                true
            }
        }
    }

    fn reveal(&self) {
        self.ui.show_top_button();
        if !self.ui.is_standalone() && self.banner_allowed() {
            self.ui.show_banner(true);
        }
        self.ui.reveal_banner_install();
    }

    fn hide_all(&self) {
        self.ui.hide_top_button();
        self.ui.hide_banner();
    }

    fn mark_seen(&self) {
        if let Err(err) = self.policy.mark_seen() {
            self.logger
                .warn_with("Failed to record version seen", &[("error", &err)]);
        }
    }

    /// Handle an install click.
    ///
    /// Replays the held prompt at most once. Returns the user's choice, or
    /// `None` when no prompt was held.
    pub async fn accept(
        &self,
        source: InstallSource,
    ) -> Result<Option<InstallOutcome>, PromptError> {
        // Taken before awaiting so a second click never sees the same prompt.
        let prompt = self.deferred.borrow_mut().take();

        let Some(prompt) = prompt else {
            if source == InstallSource::Banner {
                self.mark_seen();
                self.ui.hide_banner();
            }
            return Ok(None);
        };

        let result = prompt.prompt().await;
        match result {
            Ok(outcome) => {
                self.state.set(match outcome {
                    InstallOutcome::Accepted => InstallState::Accepted,
                    InstallOutcome::Dismissed => InstallState::Dismissed,
                });
                self.mark_seen();
                self.hide_all();
                self.logger
                    .info_with("Install prompt answered", &[("outcome", &outcome)]);
                Ok(Some(outcome))
            }
            Err(err) => {
                self.state.set(InstallState::Expired);
                self.ui.hide_top_button();
                self.logger
                    .error_with("Install prompt failed", &[("error", &err)]);
                Err(err)
            }
        }
    }

    /// Handle "Not now": snooze the banner and acknowledge this version.
    pub fn dismiss(&self) {
        match self.policy.snooze() {
            Ok(until) => self
                .logger
                .debug_builder("Banner snoozed")
                .field_i64("until", until)
                .emit(),
            Err(err) => self
                .logger
                .warn_with("Failed to snooze banner", &[("error", &err)]),
        }
        self.mark_seen();
        self.ui.hide_banner();
    }

    /// Handle `appinstalled`.
    pub fn on_app_installed(&self) {
        if self.deferred.borrow_mut().take().is_some() {
            self.state.set(InstallState::Expired);
        }
        self.hide_all();
        self.logger.info("App successfully installed");
    }
}
