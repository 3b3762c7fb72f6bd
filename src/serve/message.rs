//! Reload message protocol.
//!
//! JSON frames pushed from the dev server to browser clients:
//!
//! - `reload`: full page reload
//! - `css`: swap stylesheets in place, no page reload
//! - `connected`: handshake greeting

use serde::Serialize;

/// Message sent to browsers over the reload WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload.
    Reload {
        /// What finished rebuilding.
        reason: String,
    },

    /// Stylesheet refresh without losing page state.
    Css,

    /// Connection established.
    Connected {
        /// Server version, for debugging mismatched clients.
        version: String,
    },
}

impl ReloadMessage {
    /// Create a reload message naming the rebuilt category.
    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: reason.into(),
        }
    }

    /// Create a CSS refresh message.
    pub fn css() -> Self {
        Self::Css
    }

    /// Create the greeting sent to a freshly connected client.
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
