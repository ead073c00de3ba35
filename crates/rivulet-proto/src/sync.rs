//! Sync loop state.

use serde::{Deserialize, Serialize};

/// State of the session's background sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    /// Not started.
    #[default]
    Idle,
    /// Performing the first full sync.
    InitialSync,
    /// Incremental syncs are running.
    Running {
        /// The loop resumed after being paused.
        after_pause: bool,
    },
    /// Paused, e.g. while the app is in the background.
    Paused,
    /// Stopping.
    Killing,
    /// Stopped.
    Killed,
    /// No network connectivity.
    NoNetwork,
    /// The access token was rejected; the session must sign in again.
    InvalidToken,
}

impl SyncState {
    /// The loop is actively syncing.
    pub fn is_running(self) -> bool {
        matches!(self, Self::InitialSync | Self::Running { .. })
    }
}
