use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// `{enabled, disabledGroups, reenableAt}`. The timer itself is
/// owned by the infrastructure layer (it needs a runtime); this type only
/// carries the state the timer observes and mutates under a single lock.
///
/// Invariant: when `enabled == true`, `disabled_groups` is empty.
#[derive(Debug, Clone)]
pub struct BlockingState {
    pub enabled: bool,
    pub disabled_groups: BTreeSet<Arc<str>>,
    pub reenable_at: Option<SystemTime>,
}

impl Default for BlockingState {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled_groups: BTreeSet::new(),
            reenable_at: None,
        }
    }
}

impl BlockingState {
    /// `disable(0, …)` means "forever until re-enabled" (no timer, no
    /// `reenable_at`). `disable(d>0, …)` schedules `reenable_at = now + d`.
    /// Idempotent: calling `disable` twice with the same groups converges to
    /// one state (property 5), since this sets fields rather than toggling.
    pub fn disable(&mut self, duration: Duration, groups: impl IntoIterator<Item = Arc<str>>) {
        self.enabled = false;
        self.disabled_groups = groups.into_iter().collect();
        self.reenable_at = if duration.is_zero() {
            None
        } else {
            Some(SystemTime::now() + duration)
        };
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.disabled_groups.clear();
        self.reenable_at = None;
    }

    /// Groups still subject to filtering after removing any disabled tag.
    pub fn active_groups<'a>(&self, groups_to_check: &'a BTreeSet<Arc<str>>) -> BTreeSet<Arc<str>> {
        if self.enabled {
            return groups_to_check.clone();
        }
        groups_to_check
            .difference(&self.disabled_groups)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_forever_has_no_timer() {
        let mut s = BlockingState::default();
        s.disable(Duration::ZERO, [Arc::from("kids")]);
        assert!(!s.enabled);
        assert!(s.reenable_at.is_none());
    }

    #[test]
    fn disable_idempotent() {
        let mut a = BlockingState::default();
        a.disable(Duration::from_secs(5), [Arc::from("kids")]);
        let mut b = a.clone();
        b.disable(Duration::from_secs(5), [Arc::from("kids")]);
        assert_eq!(a.enabled, b.enabled);
        assert_eq!(a.disabled_groups, b.disabled_groups);
    }

    #[test]
    fn enable_clears_disabled_groups() {
        let mut s = BlockingState::default();
        s.disable(Duration::from_secs(5), [Arc::from("kids")]);
        s.enable();
        assert!(s.enabled);
        assert!(s.disabled_groups.is_empty());
    }

    #[test]
    fn active_groups_removes_disabled() {
        let mut s = BlockingState::default();
        s.disable(Duration::from_secs(5), [Arc::from("kids")]);
        let check: BTreeSet<Arc<str>> = [Arc::from("kids"), Arc::from("guests")].into_iter().collect();
        let active = s.active_groups(&check);
        assert!(!active.contains(&Arc::from("kids") as &Arc<str>));
        assert!(active.contains(&Arc::from("guests") as &Arc<str>));
    }
}
