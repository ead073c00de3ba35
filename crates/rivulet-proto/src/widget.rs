//! Room widgets.

use serde::{Deserialize, Serialize};

/// A widget attached to a room through an `im.vector.modular.widgets` state
/// event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    /// Widget ID (the state key).
    pub widget_id: String,
    /// Room the widget lives in.
    pub room_id: String,
    /// Widget type, e.g. `jitsi` or `m.custom`.
    pub widget_type: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Widget URL template.
    pub url: String,
    /// User that added the widget.
    pub sender: String,
    /// False once the state event content was emptied.
    pub is_active: bool,
}
