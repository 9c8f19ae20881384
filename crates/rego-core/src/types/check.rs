//! Wanted state and drift check records

use serde::Serialize;

use super::ComponentKind;

/// Desired state loaded from a snapshot for one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Wanted {
    /// Enumerable identifiers, diffed item by item
    Items(Vec<String>),
    /// Opaque configuration dump, applied all-or-nothing
    Settings(String),
}

impl Wanted {
    pub fn items(&self) -> &[String] {
        match self {
            Self::Items(items) => items,
            Self::Settings(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Items(items) => items.is_empty(),
            Self::Settings(blob) => blob.trim().is_empty(),
        }
    }
}

/// Drift of one kind against the live system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Drift {
    Items {
        /// Wanted identifiers absent from the host, in wanted order
        to_apply: Vec<String>,
        /// Wanted identifiers already present
        skipped_count: usize,
        /// The live probe failed; `to_apply` holds everything wanted
        probe_unavailable: bool,
    },
    Settings {
        /// A non-empty blob exists and will be loaded as a whole
        present: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCheck {
    pub kind: ComponentKind,
    pub drift: Drift,
}

impl KindCheck {
    pub fn to_apply(&self) -> &[String] {
        match &self.drift {
            Drift::Items { to_apply, .. } => to_apply,
            Drift::Settings { .. } => &[],
        }
    }

    pub fn skipped_count(&self) -> usize {
        match &self.drift {
            Drift::Items { skipped_count, .. } => *skipped_count,
            Drift::Settings { .. } => 0,
        }
    }

    pub fn probe_unavailable(&self) -> bool {
        matches!(
            self.drift,
            Drift::Items {
                probe_unavailable: true,
                ..
            }
        )
    }

    /// Number of actions a live restore would attempt
    pub fn action_count(&self) -> usize {
        match &self.drift {
            Drift::Items { to_apply, .. } => to_apply.len(),
            Drift::Settings { present } => usize::from(*present),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.action_count() == 0
    }
}

/// Ephemeral restore plan across kinds, never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreCheck {
    pub kinds: Vec<KindCheck>,
}

impl RestoreCheck {
    pub fn push(&mut self, check: KindCheck) {
        self.kinds.push(check);
    }

    pub fn get(&self, kind: &ComponentKind) -> Option<&KindCheck> {
        self.kinds.iter().find(|c| &c.kind == kind)
    }

    /// Whether any settings blob will be loaded
    pub fn has_settings(&self) -> bool {
        self.kinds
            .iter()
            .any(|c| matches!(c.drift, Drift::Settings { present: true }))
    }

    pub fn total_to_apply(&self) -> usize {
        self.kinds.iter().map(KindCheck::action_count).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.kinds.iter().map(KindCheck::skipped_count).sum()
    }

    pub fn is_satisfied(&self) -> bool {
        self.kinds.iter().all(KindCheck::is_satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_check_totals() {
        let mut check = RestoreCheck::default();
        check.push(KindCheck {
            kind: ComponentKind::Flatpak,
            drift: Drift::Items {
                to_apply: vec!["org.app.B".into()],
                skipped_count: 1,
                probe_unavailable: false,
            },
        });
        check.push(KindCheck {
            kind: ComponentKind::ShellSettings,
            drift: Drift::Settings { present: true },
        });

        assert!(check.has_settings());
        assert_eq!(check.total_to_apply(), 2);
        assert_eq!(check.total_skipped(), 1);
        assert!(!check.is_satisfied());
    }

    #[test]
    fn test_empty_settings_blob() {
        assert!(Wanted::Settings("  \n".into()).is_empty());
        assert!(!Wanted::Items(vec!["a".into()]).is_empty());
    }
}
