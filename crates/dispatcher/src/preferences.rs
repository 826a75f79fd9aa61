//! Shared, live notification preferences

use std::sync::Arc;

use contracts::NotificationPreferences;
use parking_lot::RwLock;

/// Cheap-to-clone handle to externally owned preferences.
///
/// The owner mutates through `update`/`replace`; the dispatcher reads at each
/// notify decision, so changes apply to the very next event.
#[derive(Debug, Clone, Default)]
pub struct PreferenceHandle(Arc<RwLock<NotificationPreferences>>);

impl PreferenceHandle {
    /// Wrap initial preferences
    pub fn new(preferences: NotificationPreferences) -> Self {
        Self(Arc::new(RwLock::new(preferences)))
    }

    /// Read under the lock
    pub fn read<R>(&self, f: impl FnOnce(&NotificationPreferences) -> R) -> R {
        f(&self.0.read())
    }

    /// Mutate in place
    pub fn update(&self, f: impl FnOnce(&mut NotificationPreferences)) {
        f(&mut self.0.write());
    }

    /// Replace wholesale
    pub fn replace(&self, preferences: NotificationPreferences) {
        *self.0.write() = preferences;
    }

    /// Copy of the current preferences
    pub fn snapshot(&self) -> NotificationPreferences {
        self.0.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Severity;

    #[test]
    fn test_updates_visible_through_clones() {
        let owner = PreferenceHandle::default();
        let reader = owner.clone();
        assert!(reader.read(|p| p.permits("AUTH", Severity::Warning)));

        owner.update(|p| p.do_not_disturb = true);
        assert!(!reader.read(|p| p.permits("AUTH", Severity::Warning)));

        owner.replace(NotificationPreferences::default());
        assert!(!reader.snapshot().do_not_disturb);
    }
}
