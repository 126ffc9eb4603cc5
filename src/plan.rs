use crate::combat::{estimated_survivors, AttritionParams};
use crate::snapshot::Snapshot;
use crate::territory::{Path, PlayerId, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set of attack paths, node-disjoint apart from their anchors, consumed
/// one conquest at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Plan {
    pub paths: Vec<Path>,
}

impl Plan {
    pub fn new(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// The next `(source, target)` step. Paths take turns: the chosen path is
    /// moved to the back so the fronts advance together.
    pub fn next_attack(&mut self) -> Option<(TerritoryId, TerritoryId)> {
        if self.paths.is_empty() {
            return None;
        }
        let path = self.paths.remove(0);
        let step = (path[0], path[1]);
        self.paths.push(path);
        Some(step)
    }

    /// Records a conquest launched from `from`. Returns false when no path is
    /// anchored there.
    pub fn advance(&mut self, from: TerritoryId) -> bool {
        let found = match self.paths.iter_mut().find(|path| path[0] == from) {
            Some(path) => {
                path.remove(0);
                true
            }
            None => false,
        };
        self.paths.retain(|path| path.len() > 1);
        found
    }

    pub fn min_estimated_survivors(&self, snapshot: &Snapshot, params: &AttritionParams) -> Option<f64> {
        self.paths
            .iter()
            .map(|path| estimated_survivors(path, snapshot, params))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Number of paths whose last territory is in `endings`.
    pub fn endings_in(&self, endings: &BTreeSet<TerritoryId>) -> usize {
        self.paths
            .iter()
            .filter(|path| path.last().map_or(false, |t| endings.contains(t)))
            .count()
    }

    /// True when some path no longer starts on our land or its next target
    /// has already fallen to us.
    pub fn is_stale(&self, snapshot: &Snapshot, me: PlayerId) -> bool {
        self.paths.iter().any(|path| {
            !snapshot.is_owned_by(path[0], me) || path[1..].iter().any(|&t| snapshot.is_owned_by(t, me))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_attack_rotates_paths() {
        let mut plan = Plan::new(vec![vec![0, 1, 2], vec![5, 6]]);
        assert_eq!(plan.next_attack(), Some((0, 1)));
        assert_eq!(plan.next_attack(), Some((5, 6)));
        assert_eq!(plan.next_attack(), Some((0, 1)));
    }

    #[test]
    fn advance_pops_and_discards() {
        let mut plan = Plan::new(vec![vec![0, 1, 2], vec![5, 6]]);
        assert!(plan.advance(5));
        assert_eq!(plan.paths, vec![vec![0, 1, 2]]);
        assert!(plan.advance(0));
        assert_eq!(plan.paths, vec![vec![1, 2]]);
        assert!(!plan.advance(9));
        assert!(plan.advance(1));
        assert!(plan.is_empty());
        assert_eq!(plan.next_attack(), None);
    }

    #[test]
    fn staleness_follows_ownership() {
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 9);
        snapshot.set(1, Some(1), 1);
        snapshot.set(2, Some(1), 1);
        let plan = Plan::new(vec![vec![0, 1, 2]]);
        assert!(!plan.is_stale(&snapshot, 0));

        snapshot.set(2, Some(0), 1);
        assert!(plan.is_stale(&snapshot, 0));

        snapshot.set(2, Some(1), 1);
        snapshot.set(0, Some(1), 1);
        assert!(plan.is_stale(&snapshot, 0));
    }

    #[test]
    fn weakest_path_estimate() {
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 10);
        snapshot.set(1, None, 2);
        snapshot.set(5, Some(0), 4);
        snapshot.set(6, None, 1);
        let plan = Plan::new(vec![vec![0, 1], vec![5, 6]]);
        let weakest = plan
            .min_estimated_survivors(&snapshot, &AttritionParams::default())
            .unwrap();
        assert!((weakest - (4.0 - 0.857 - 1.0)).abs() < 1e-9);
    }
}
