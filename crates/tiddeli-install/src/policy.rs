//! When the install banner may be shown.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tiddeli_core::{Clock, KeyValueStore, StorageError};

/// Storage key of the snooze deadline (epoch milliseconds, decimal string).
pub const SNOOZE_KEY: &str = "installBannerSnoozedUntil";

/// Storage key of the last version the user saw the banner for.
pub const VERSION_SEEN_KEY: &str = "installBannerLastVersionSeen";

/// How long "Not now" hides the banner.
pub const SNOOZE_DAYS: i64 = 7;

/// Persisted banner preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerPrefs {
    /// Snooze deadline in epoch milliseconds. `None` when unset or unparseable.
    pub snooze_until: Option<i64>,
    /// Version the banner was last acknowledged for.
    pub last_version_seen: Option<String>,
}

impl BannerPrefs {
    /// Whether the banner may be shown for `version` at `now_millis`.
    ///
    /// A version the user has not acknowledged always shows the banner,
    /// regardless of any snooze.
    pub fn allows_banner(&self, version: &str, now_millis: i64) -> bool {
        if self.last_version_seen.as_deref() != Some(version) {
            return true;
        }

        match self.snooze_until {
            None => true,
            Some(until) => now_millis > until,
        }
    }
}

/// Reads and writes the banner preferences for the running version.
pub struct BannerPolicy<S, C> {
    store: S,
    clock: C,
    version: String,
}

impl<S: KeyValueStore, C: Clock> BannerPolicy<S, C> {
    /// Create a policy for the running version.
    pub fn new(store: S, clock: C, version: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            version: version.into(),
        }
    }

    /// Running version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Load the stored preferences.
    pub fn load(&self) -> Result<BannerPrefs, StorageError> {
        let snooze_until = self
            .store
            .get(SNOOZE_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        let last_version_seen = self.store.get(VERSION_SEEN_KEY)?;

        Ok(BannerPrefs {
            snooze_until,
            last_version_seen,
        })
    }

    /// Whether the banner may be shown now.
    pub fn can_show_banner(&self) -> Result<bool, StorageError> {
        let prefs = self.load()?;
        Ok(prefs.allows_banner(&self.version, self.clock.now_millis()))
    }

    /// Snooze the banner for [`SNOOZE_DAYS`]. Returns the deadline.
    pub fn snooze(&self) -> Result<i64, StorageError> {
        let until = (self.clock.now() + Duration::days(SNOOZE_DAYS)).timestamp_millis();
        self.store.set(SNOOZE_KEY, &until.to_string())?;
        Ok(until)
    }

    /// Record that the banner was acknowledged for the running version.
    pub fn mark_seen(&self) -> Result<(), StorageError> {
        self.store.set(VERSION_SEEN_KEY, &self.version)
    }
}
