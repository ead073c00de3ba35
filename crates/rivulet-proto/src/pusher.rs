//! Push gateway registrations.

use serde::{Deserialize, Serialize};

/// Registration state of a pusher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PusherState {
    /// Known locally, not registered.
    #[default]
    Unregistered,
    /// Registration request in flight.
    Registering,
    /// Registered with the homeserver.
    Registered,
    /// Registration failed.
    FailedToRegister,
}

/// A pusher registered for the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pusher {
    /// Unique push key (device token).
    pub push_key: String,
    /// Pusher kind, `http` or `email`.
    pub kind: String,
    /// Application identifier.
    pub app_id: String,
    /// Application display name.
    pub app_display_name: String,
    /// Device display name.
    pub device_display_name: String,
    /// Preferred language.
    pub lang: String,
    /// Push gateway URL for `http` pushers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_url: Option<String>,
    /// Registration state.
    #[serde(default)]
    pub state: PusherState,
}
