use serde::Serialize;

/// Optimistic avatar change. The requested key is shown while the remote
/// update is in flight; a failure restores the previous key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AvatarChange {
    Idle { current: String },
    Pending { previous: String, requested: String },
    Committed { current: String },
    RolledBack { current: String, reason: String },
}

impl AvatarChange {
    pub fn new(current: &str) -> Self {
        AvatarChange::Idle {
            current: current.to_string(),
        }
    }

    /// Key the UI should render right now.
    pub fn displayed(&self) -> &str {
        match self {
            AvatarChange::Idle { current }
            | AvatarChange::Committed { current }
            | AvatarChange::RolledBack { current, .. } => current,
            AvatarChange::Pending { requested, .. } => requested,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AvatarChange::Pending { .. })
    }

    /// Starts a change. Ignored while another change is pending.
    pub fn begin(&mut self, requested: &str) -> bool {
        if self.is_pending() {
            return false;
        }
        let previous = self.displayed().to_string();
        *self = AvatarChange::Pending {
            previous,
            requested: requested.to_string(),
        };
        true
    }

    pub fn commit(&mut self) {
        if let AvatarChange::Pending { requested, .. } = self {
            *self = AvatarChange::Committed {
                current: std::mem::take(requested),
            };
        }
    }

    pub fn roll_back(&mut self, reason: impl Into<String>) {
        if let AvatarChange::Pending { previous, .. } = self {
            *self = AvatarChange::RolledBack {
                current: std::mem::take(previous),
                reason: reason.into(),
            };
        }
    }
}
