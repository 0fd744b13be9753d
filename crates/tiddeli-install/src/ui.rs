//! Platform seams: the deferred prompt and the install UI.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PromptError;

/// The user's answer to the platform install prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

impl InstallOutcome {
    /// Parse `userChoice.outcome`. Anything but `accepted` counts as dismissed.
    pub fn parse(outcome: &str) -> Self {
        if outcome == "accepted" {
            Self::Accepted
        } else {
            Self::Dismissed
        }
    }
}

impl std::fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

/// A deferred install prompt (`BeforeInstallPromptEvent`). Single use.
#[async_trait(?Send)]
pub trait InstallPrompt {
    /// Show the platform prompt and wait for the user's choice.
    async fn prompt(&self) -> Result<InstallOutcome, PromptError>;
}

/// The install UI elements. Missing elements are no-ops.
pub trait InstallUi {
    /// Show the top install button and hide its placeholder.
    fn show_top_button(&self);

    /// Hide the top install button and show its placeholder.
    fn hide_top_button(&self);

    /// Show the banner. Its Install button is shown only if `install_available`.
    fn show_banner(&self, install_available: bool);

    /// Hide the banner.
    fn hide_banner(&self);

    /// Show the banner's Install button.
    fn reveal_banner_install(&self);

    /// Whether the app runs in standalone display mode (already installed).
    fn is_standalone(&self) -> bool;
}

impl<T: InstallUi + ?Sized> InstallUi for Rc<T> {
    fn show_top_button(&self) {
        (**self).show_top_button()
    }

    fn hide_top_button(&self) {
        (**self).hide_top_button()
    }

    fn show_banner(&self, install_available: bool) {
        (**self).show_banner(install_available)
    }

    fn hide_banner(&self) {
        (**self).hide_banner()
    }

    fn reveal_banner_install(&self) {
        (**self).reveal_banner_install()
    }

    fn is_standalone(&self) -> bool {
        (**self).is_standalone()
    }
}

/// Prompt that answers with a fixed outcome and counts how often it was shown.
#[derive(Debug, Clone)]
pub struct ScriptedPrompt {
    answer: Result<InstallOutcome, PromptError>,
    shown: Rc<Cell<usize>>,
}

impl ScriptedPrompt {
    /// Prompt that answers with `outcome`.
    pub fn answering(outcome: InstallOutcome) -> Self {
        Self {
            answer: Ok(outcome),
            shown: Rc::new(Cell::new(0)),
        }
    }

    /// Prompt that fails.
    pub fn failing(error: PromptError) -> Self {
        Self {
            answer: Err(error),
            shown: Rc::new(Cell::new(0)),
        }
    }

    /// Counter shared with clones, readable after the prompt was moved away.
    pub fn shown_counter(&self) -> Rc<Cell<usize>> {
        self.shown.clone()
    }
}

#[async_trait(?Send)]
impl InstallPrompt for ScriptedPrompt {
    async fn prompt(&self) -> Result<InstallOutcome, PromptError> {
        self.shown.set(self.shown.get() + 1);
        self.answer.clone()
    }
}

/// Install UI that records visibility (for native builds and tests).
#[derive(Debug, Default)]
pub struct MemoryInstallUi {
    standalone: Cell<bool>,
    top_button: Cell<bool>,
    banner: Cell<bool>,
    banner_install: Cell<bool>,
    banner_shows: Cell<usize>,
}

impl MemoryInstallUi {
    /// Create a UI with everything hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a UI running in standalone display mode.
    pub fn standalone() -> Self {
        let ui = Self::default();
        ui.standalone.set(true);
        ui
    }

    /// Whether the top install button is visible (placeholder hidden).
    pub fn top_button_visible(&self) -> bool {
        self.top_button.get()
    }

    /// Whether the banner is visible.
    pub fn banner_visible(&self) -> bool {
        self.banner.get()
    }

    /// Whether the banner's Install button is visible.
    pub fn banner_install_visible(&self) -> bool {
        self.banner_install.get()
    }

    /// How many times the banner was shown.
    pub fn banner_shows(&self) -> usize {
        self.banner_shows.get()
    }
}

impl InstallUi for MemoryInstallUi {
    fn show_top_button(&self) {
        self.top_button.set(true);
    }

    fn hide_top_button(&self) {
        self.top_button.set(false);
    }

    fn show_banner(&self, install_available: bool) {
        self.banner.set(true);
        self.banner_install.set(install_available);
        self.banner_shows.set(self.banner_shows.get() + 1);
    }

    fn hide_banner(&self) {
        self.banner.set(false);
    }

    fn reveal_banner_install(&self) {
        self.banner_install.set(true);
    }

    fn is_standalone(&self) -> bool {
        self.standalone.get()
    }
}
