//! Users and third-party identifiers.

use serde::{Deserialize, Serialize};

/// A user known to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID, e.g. `@alice:example.org`.
    pub user_id: String,
    /// Global display name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
    /// Global avatar.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Create a user with no profile information.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), display_name: None, avatar_url: None }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Display name, falling back to the user ID.
    pub fn best_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// Third-party identifier bound to the account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "medium", content = "address", rename_all = "snake_case")]
pub enum ThreePid {
    /// Email address.
    Email(String),
    /// Phone number in international format.
    Msisdn(String),
}

impl ThreePid {
    /// The address or number.
    pub fn value(&self) -> &str {
        match self {
            Self::Email(v) | Self::Msisdn(v) => v,
        }
    }

    /// Medium name as used by the identity server API.
    pub fn medium(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Msisdn(_) => "msisdn",
        }
    }
}
