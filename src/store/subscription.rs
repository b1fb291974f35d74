use super::traits::Unsubscribe;

/// Owns a store subscription and releases it exactly once: on [`cancel`] or,
/// failing that, on drop.
///
/// [`cancel`]: Subscription::cancel
pub struct Subscription {
    label: String,
    cancel: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new(label: impl Into<String>, cancel: Unsubscribe) -> Self {
        Self {
            label: label.into(),
            cancel: Some(cancel),
        }
    }

    /// The path this subscription watches.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Release the subscription. Later calls do nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            tracing::debug!(subscription = %self.label, "subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
