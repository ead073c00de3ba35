//! Group summaries.

use serde::{Deserialize, Serialize};

use crate::room::Membership;

/// Summary of a group (community).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group identifier, e.g. `+group:example.org`.
    pub group_id: String,
    /// Display name.
    pub display_name: String,
    /// Membership of the local user.
    pub membership: Membership,
    /// Avatar URL.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar_url: Option<String>,
    /// Short description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub short_description: Option<String>,
}
