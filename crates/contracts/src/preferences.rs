//! NotificationPreferences - user-owned notification gating

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Severity;

/// Per-user notification preferences.
///
/// Owned outside the dispatcher and may change at any time; the dispatcher
/// reads it at the moment of each notify decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub sound: bool,

    #[serde(default = "default_true")]
    pub vibration: bool,

    #[serde(default = "default_true")]
    pub desktop: bool,

    /// Suppresses everything below `critical`
    #[serde(default)]
    pub do_not_disturb: bool,

    /// Per-category switch; categories not listed are enabled
    #[serde(default)]
    pub categories: HashMap<String, bool>,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
            desktop: true,
            do_not_disturb: false,
            categories: HashMap::new(),
        }
    }
}

impl NotificationPreferences {
    /// Whether the category is enabled
    pub fn category_enabled(&self, category: &str) -> bool {
        self.categories.get(category).copied().unwrap_or(true)
    }

    /// Whether a notify-worthy event should actually be delivered.
    ///
    /// A disabled category always wins; do-not-disturb holds back everything
    /// except `critical`.
    pub fn permits(&self, category: &str, severity: Severity) -> bool {
        if !self.category_enabled(category) {
            return false;
        }
        !self.do_not_disturb || severity.is_critical()
    }

    /// Delivery channels currently enabled
    pub fn channels(&self) -> DeliveryChannels {
        DeliveryChannels {
            sound: self.sound,
            vibration: self.vibration,
            desktop: self.desktop,
        }
    }
}

/// Delivery channels attached to a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryChannels {
    pub sound: bool,
    pub vibration: bool,
    pub desktop: bool,
}

/// Notification sink payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub channels: DeliveryChannels,
}
