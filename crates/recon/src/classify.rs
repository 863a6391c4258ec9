use crate::grants::GrantSet;
use crate::model::ActionKind;

/// Result of comparing the feed's grants with the repository's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Unchanged,
    /// Item had no grants; feed has these.
    Added(String),
    /// Feed has no grants; item had these.
    Removed(String),
    Changed { old: String, new: String },
}

impl ScanOutcome {
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            Self::Unchanged => None,
            Self::Added(_) => Some(ActionKind::Added),
            Self::Removed(_) => Some(ActionKind::Removed),
            Self::Changed { .. } => Some(ActionKind::Changed),
        }
    }

    /// Funding column of the result log.
    pub fn summary(&self) -> String {
        match self {
            Self::Unchanged => String::new(),
            Self::Added(new) => new.clone(),
            Self::Removed(old) => old.clone(),
            Self::Changed { old, new } => format!("{old} -> {new}"),
        }
    }
}

/// Classify the difference between `feed` (new) and `item` (old).
///
/// Added and removed are checked before the generic changed case so that a
/// complete gain or loss of funding is reported as such.
pub fn classify(feed: &GrantSet, item: &GrantSet) -> ScanOutcome {
    if feed == item {
        ScanOutcome::Unchanged
    } else if item.is_empty() {
        ScanOutcome::Added(feed.canonical())
    } else if feed.is_empty() {
        ScanOutcome::Removed(item.canonical())
    } else {
        ScanOutcome::Changed {
            old: item.canonical(),
            new: feed.canonical(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> GrantSet {
        GrantSet::from_names(names.iter().copied())
    }

    #[test]
    fn both_empty_unchanged() {
        assert_eq!(classify(&set(&[]), &set(&[])), ScanOutcome::Unchanged);
    }

    #[test]
    fn same_names_any_order_unchanged() {
        assert_eq!(classify(&set(&["NSF", "DOE"]), &set(&["DOE", "NSF", "NSF"])), ScanOutcome::Unchanged);
    }

    #[test]
    fn gain_is_added() {
        let out = classify(&set(&["NSF"]), &set(&[]));
        assert_eq!(out, ScanOutcome::Added("NSF".into()));
        assert_eq!(out.action(), Some(ActionKind::Added));
        assert_eq!(out.summary(), "NSF");
    }

    #[test]
    fn loss_is_removed() {
        let out = classify(&set(&[]), &set(&["NSF"]));
        assert_eq!(out, ScanOutcome::Removed("NSF".into()));
        assert_eq!(out.action(), Some(ActionKind::Removed));
    }

    #[test]
    fn difference_is_changed_old_then_new() {
        let out = classify(&set(&["NSF", "DOE"]), &set(&["NSF"]));
        assert_eq!(
            out,
            ScanOutcome::Changed { old: "NSF".into(), new: "DOE||NSF".into() }
        );
        assert_eq!(out.summary(), "NSF -> DOE||NSF");
    }

    #[test]
    fn unchanged_has_no_action() {
        assert_eq!(ScanOutcome::Unchanged.action(), None);
        assert_eq!(ScanOutcome::Unchanged.summary(), "");
    }
}
