//! Multi-source path-cover search ("warpath").
//!
//! Given owned anchor territories and a target region, finds sets of paths,
//! disjoint apart from their anchors, whose conquered territories together
//! cover every territory of the region we do not already hold. Each path must
//! stay strong enough, by the closed-form attrition estimate, to keep
//! advancing. The search is an exhaustive backtracking DFS bounded by a node
//! budget; running out of budget simply ends the search with whatever was
//! found.

use crate::board::Board;
use crate::combat::{estimated_survivors, AttritionParams};
use crate::plan::Plan;
use crate::snapshot::Snapshot;
use crate::territory::{Path, PlayerId, TerritoryId};
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// One backtracking search. Owns its mutable path list and budget, so
/// independent searches can run on separate threads.
pub struct WarpathSearch<'a> {
    board: &'a Board,
    snapshot: &'a Snapshot,
    target: &'a BTreeSet<TerritoryId>,
    owned: &'a BTreeSet<TerritoryId>,
    params: &'a AttritionParams,
    strength_checks: bool,
    budget: usize,
    exhausted: bool,
    paths: Vec<Path>,
    solutions: Vec<Plan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub solutions: Vec<Plan>,
    /// The node budget ran out before the search space was exhausted.
    pub exhausted: bool,
    /// Nodes left in the budget.
    pub remaining_budget: usize,
}

impl<'a> WarpathSearch<'a> {
    pub fn new(
        board: &'a Board,
        snapshot: &'a Snapshot,
        target: &'a BTreeSet<TerritoryId>,
        owned: &'a BTreeSet<TerritoryId>,
        params: &'a AttritionParams,
        budget: usize,
    ) -> Self {
        Self {
            board,
            snapshot,
            target,
            owned,
            params,
            strength_checks: true,
            budget,
            exhausted: false,
            paths: vec![],
            solutions: vec![],
        }
    }

    /// Drops the feasibility pruning: the search then looks for any cover,
    /// however costly.
    pub fn without_pruning(mut self) -> Self {
        self.strength_checks = false;
        self
    }

    pub fn search(mut self, starting_points: &[TerritoryId]) -> SearchOutcome {
        self.paths = starting_points.iter().map(|&t| vec![t]).collect();
        self.expand();
        if self.exhausted {
            debug!(found = self.solutions.len(), "warpath search budget exhausted");
        }
        SearchOutcome {
            solutions: self.solutions,
            exhausted: self.exhausted,
            remaining_budget: self.budget,
        }
    }

    fn expand(&mut self) {
        if self.budget == 0 {
            self.exhausted = true;
            return;
        }
        self.budget -= 1;

        // A path that cannot take its last territory with troops to spare can
        // never be executed, and extending it only makes it weaker.
        for path in &self.paths {
            if self.strength_checks
                && path.len() > 1
                && !self
                    .params
                    .is_feasible(estimated_survivors(path, self.snapshot, self.params))
            {
                return;
            }
        }

        let visited: BTreeSet<TerritoryId> = self.paths.iter().flatten().copied().collect();
        let frontier: Vec<(usize, TerritoryId)> = self
            .paths
            .iter()
            .enumerate()
            .flat_map(|(i, path)| {
                let tail = path[path.len() - 1];
                self.board
                    .adjacent_to(tail)
                    .iter()
                    .copied()
                    .filter(|n| {
                        self.target.contains(n) && !visited.contains(n) && !self.owned.contains(n)
                    })
                    .map(move |n| (i, n))
            })
            .collect();

        if frontier.is_empty() {
            let covered = self
                .target
                .iter()
                .all(|t| visited.contains(t) || self.owned.contains(t));
            if covered {
                let paths = self
                    .paths
                    .iter()
                    .filter(|path| path.len() > 1)
                    .cloned()
                    .collect();
                self.solutions.push(Plan::new(paths));
            }
            return;
        }

        for (i, neighbour) in frontier {
            self.paths[i].push(neighbour);
            self.expand();
            self.paths[i].pop();
            if self.exhausted {
                return;
            }
        }
    }
}

/// Target territories that touch land outside the target, minus what we
/// hold. Paths ending there leave the army poised on the next frontier.
pub fn ideal_ending_points(
    board: &Board,
    target: &BTreeSet<TerritoryId>,
    owned: &BTreeSet<TerritoryId>,
) -> BTreeSet<TerritoryId> {
    board
        .border_territories(target)
        .difference(owned)
        .copied()
        .collect()
}

/// Our territories next to the target region with enough troops to lead an attack.
pub fn starting_territories(
    board: &Board,
    snapshot: &Snapshot,
    target: &BTreeSet<TerritoryId>,
    me: PlayerId,
    min_troops: u32,
) -> BTreeSet<TerritoryId> {
    target
        .iter()
        .flat_map(|&t| board.adjacent_to(t).iter().copied())
        .filter(|&n| snapshot.is_owned_by(n, me) && snapshot.troops(n) >= min_troops)
        .collect()
}

/// Read-only context shared by every planning call of one turn.
#[derive(Clone, Copy)]
pub struct Planner<'a> {
    pub board: &'a Board,
    pub snapshot: &'a Snapshot,
    pub owned: &'a BTreeSet<TerritoryId>,
    pub params: &'a AttritionParams,
    pub budget: usize,
    /// Gate, prune and reject plans the anchors cannot afford. Off when
    /// sizing reinforcements, where the shortfall is the point.
    pub strength_checks: bool,
}

impl<'a> Planner<'a> {
    pub fn new(
        board: &'a Board,
        snapshot: &'a Snapshot,
        owned: &'a BTreeSet<TerritoryId>,
        params: &'a AttritionParams,
        budget: usize,
    ) -> Self {
        Self {
            board,
            snapshot,
            owned,
            params,
            budget,
            strength_checks: true,
        }
    }

    pub fn coverage_only(self) -> Self {
        Self {
            strength_checks: false,
            ..self
        }
    }

    fn assert_contract(&self, starting_points: &[TerritoryId], target: &BTreeSet<TerritoryId>) {
        for start in starting_points {
            assert!(
                self.owned.contains(start),
                "Starting point {} is not owned by the acting player",
                start
            );
        }
        for territory in target {
            assert!(
                self.board.contains(*territory),
                "Target region references unknown territory {}",
                territory
            );
        }
    }

    /// The necessary-condition gate: false means no plan can succeed and the
    /// search must not run.
    fn passes_gate(&self, starting_points: &[TerritoryId], enemy: &BTreeSet<TerritoryId>) -> bool {
        let starting_power = self.snapshot.total_troops(starting_points);
        let enemy_power = self.snapshot.total_troops(enemy);
        self.params
            .strength_gate(starting_power, enemy_power, enemy.len())
    }

    fn enemy_in(&self, target: &BTreeSet<TerritoryId>) -> BTreeSet<TerritoryId> {
        target.difference(self.owned).copied().collect()
    }

    /// Every covering plan anchored on `starting_points` found within the budget.
    #[instrument(level = "debug", skip_all, fields(anchors = starting_points.len(), target = target.len()))]
    pub fn plan(&self, starting_points: &BTreeSet<TerritoryId>, target: &BTreeSet<TerritoryId>) -> Vec<Plan> {
        let starting_points: Vec<TerritoryId> = starting_points.iter().copied().collect();
        self.assert_contract(&starting_points, target);
        let outcome = self.plan_from(&starting_points, target, self.budget);
        if outcome.exhausted {
            warn!(found = outcome.solutions.len(), "attack planning ran out of budget");
        }
        outcome.solutions
    }

    fn plan_from(&self, starting_points: &[TerritoryId], target: &BTreeSet<TerritoryId>, budget: usize) -> SearchOutcome {
        let skipped = SearchOutcome {
            solutions: vec![],
            exhausted: false,
            remaining_budget: budget,
        };
        let enemy = self.enemy_in(target);
        if starting_points.is_empty() || enemy.is_empty() {
            return skipped;
        }
        if self.strength_checks && !self.passes_gate(starting_points, &enemy) {
            debug!(?starting_points, "strength gate failed, skipping search");
            return skipped;
        }
        let search = WarpathSearch::new(self.board, self.snapshot, target, self.owned, self.params, budget);
        let search = if self.strength_checks {
            search
        } else {
            search.without_pruning()
        };
        search.search(starting_points)
    }

    /// Plans with every starting point as an anchor and keeps the best candidate.
    pub fn best_plan(&self, starting_points: &BTreeSet<TerritoryId>, target: &BTreeSet<TerritoryId>) -> Option<Plan> {
        let candidates = self.plan(starting_points, target);
        debug!(candidates = candidates.len(), "warpath candidates");
        self.select_best(candidates, &ideal_ending_points(self.board, target, self.owned))
    }

    /// Tries anchors one at a time, then pairs, triples and so on, stopping at
    /// the first group size that covers the target. Every combination gets its
    /// own search and an equal share of the budget.
    #[instrument(level = "debug", skip_all, fields(candidates = candidates.len(), target = target.len()))]
    pub fn plan_escalating(&self, candidates: &BTreeSet<TerritoryId>, target: &BTreeSet<TerritoryId>) -> Option<Plan> {
        let anchors: Vec<TerritoryId> = candidates.iter().copied().collect();
        self.assert_contract(&anchors, target);
        let ideal_endings = ideal_ending_points(self.board, target, self.owned);

        for size in 1..=anchors.len() {
            let combinations: Vec<Vec<TerritoryId>> =
                anchors.iter().copied().combinations(size).collect();
            let share = (self.budget / combinations.len()).max(1);

            let outcomes: Vec<SearchOutcome> = combinations
                .par_iter()
                .map(|combination| self.plan_from(combination, target, share))
                .collect();
            let exhausted = outcomes.iter().filter(|outcome| outcome.exhausted).count();
            if exhausted > 0 {
                warn!(size, exhausted, combinations = combinations.len(), "escalation searches ran out of budget");
            }
            let found: Vec<Plan> = outcomes.into_iter().flat_map(|outcome| outcome.solutions).collect();

            if !found.is_empty() {
                debug!(size, candidates = found.len(), "escalation found plans");
                return self.select_best(found, &ideal_endings);
            }
        }
        None
    }

    /// Prefers plans with the most paths ending on `ideal_endings`, then the
    /// plan whose weakest path keeps the most troops. With strength checks on,
    /// returns nothing when even that plan is not feasible.
    pub fn select_best(&self, candidates: Vec<Plan>, ideal_endings: &BTreeSet<TerritoryId>) -> Option<Plan> {
        let most_endings = candidates
            .iter()
            .map(|plan| plan.endings_in(ideal_endings))
            .max()?;

        let mut best: Option<(Plan, f64)> = None;
        for plan in candidates {
            if plan.endings_in(ideal_endings) != most_endings {
                continue;
            }
            let weakest = plan
                .min_estimated_survivors(self.snapshot, self.params)
                .unwrap_or(f64::INFINITY);
            match &best {
                Some((_, best_weakest)) if *best_weakest >= weakest => {}
                _ => best = Some((plan, weakest)),
            }
        }

        let (plan, weakest) = best?;
        if !self.strength_checks || self.params.is_feasible(weakest) {
            Some(plan)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_from_edges;
    use crate::territory::is_connected_path;

    fn set(ids: &[TerritoryId]) -> BTreeSet<TerritoryId> {
        ids.iter().copied().collect()
    }

    fn line_snapshot(attacker: u32) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), attacker);
        snapshot.set(1, None, 1);
        snapshot.set(2, None, 1);
        snapshot
    }

    #[test]
    fn single_line_is_covered() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let snapshot = line_snapshot(10);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100);

        let plans = planner.plan(&set(&[0]), &set(&[1, 2]));
        assert_eq!(plans, vec![Plan::new(vec![vec![0, 1, 2]])]);
        assert_eq!(
            planner.best_plan(&set(&[0]), &set(&[1, 2])),
            Some(Plan::new(vec![vec![0, 1, 2]]))
        );
    }

    #[test]
    fn weak_attacker_gets_no_plan() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let snapshot = line_snapshot(2);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100);
        assert!(planner.plan(&set(&[0]), &set(&[1, 2])).is_empty());
    }

    #[test]
    fn pruning_stops_extension_even_past_the_gate() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let mut snapshot = line_snapshot(6);
        snapshot.set(2, None, 3);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100);
        // Gate: 6 > 0.857 * 4 + 2, but [0, 1, 2] ends on 6 - 3.428 - 2 = 0.572.
        assert!(planner.plan(&set(&[0]), &set(&[1, 2])).is_empty());
    }

    #[test]
    fn coverage_only_ignores_strength() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let snapshot = line_snapshot(2);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100).coverage_only();
        let plan = planner.plan_escalating(&set(&[0]), &set(&[1, 2])).unwrap();
        assert_eq!(plan.paths, vec![vec![0, 1, 2]]);
        let shortfall = plan.min_estimated_survivors(&snapshot, &params).unwrap();
        assert!(shortfall < 0.0);
    }

    #[test]
    fn empty_inputs_give_no_plan() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let snapshot = line_snapshot(10);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100);
        assert!(planner.plan(&set(&[]), &set(&[1, 2])).is_empty());
        assert!(planner.plan(&set(&[0]), &set(&[0])).is_empty());
    }

    #[test]
    #[should_panic(expected = "not owned by the acting player")]
    fn unowned_starting_point_panics() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let snapshot = line_snapshot(10);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100);
        planner.plan(&set(&[1]), &set(&[2]));
    }

    #[test]
    #[should_panic(expected = "unknown territory 9")]
    fn unknown_target_panics() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let snapshot = line_snapshot(10);
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 100);
        planner.plan(&set(&[0]), &set(&[1, 9]));
    }

    #[test]
    fn two_components_need_two_anchors() {
        // 10 - 0    20 - 1 - 2
        let board = board_from_edges(&[(10, &[0]), (20, &[1]), (1, &[2]), (0, &[]), (2, &[])]);
        let mut snapshot = Snapshot::new();
        snapshot.set(10, Some(0), 8);
        snapshot.set(20, Some(0), 8);
        for t in [0, 1, 2] {
            snapshot.set(t, Some(1), 1);
        }
        let owned = set(&[10, 20]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 1_000);

        let best = planner.best_plan(&set(&[10, 20]), &set(&[0, 1, 2])).unwrap();
        assert_eq!(best.paths, vec![vec![10, 0], vec![20, 1, 2]]);

        let escalated = planner.plan_escalating(&set(&[10, 20]), &set(&[0, 1, 2])).unwrap();
        assert_eq!(escalated.paths.len(), 2);
    }

    #[test]
    fn escalation_prefers_a_single_anchor_when_enough() {
        // Star: 0 and 5 both border 1; 1 - 2.
        let board = board_from_edges(&[(0, &[1]), (5, &[1]), (1, &[2]), (2, &[])]);
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 4);
        snapshot.set(5, Some(0), 12);
        snapshot.set(1, Some(1), 1);
        snapshot.set(2, Some(1), 1);
        let owned = set(&[0, 5]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 1_000);

        let plan = planner.plan_escalating(&set(&[0, 5]), &set(&[1, 2])).unwrap();
        assert_eq!(plan.paths, vec![vec![5, 1, 2]]);
    }

    #[test]
    fn prefers_paths_ending_next_to_the_frontier() {
        // Triangle 1 - 2 - 3 entered from 0; only 2 touches the outside (4),
        // so [0, 1, 3, 2] beats the first solution found, [0, 1, 2, 3].
        let board = board_from_edges(&[(0, &[1]), (1, &[2, 3]), (2, &[3, 4]), (3, &[]), (4, &[])]);
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 20);
        for t in [1, 2, 3, 4] {
            snapshot.set(t, Some(1), 1);
        }
        let owned = set(&[0]);
        let params = AttritionParams::default();
        let planner = Planner::new(&board, &snapshot, &owned, &params, 1_000);

        let target = set(&[1, 2, 3]);
        assert_eq!(planner.plan(&set(&[0]), &target).len(), 2);
        let best = planner.best_plan(&set(&[0]), &target).unwrap();
        assert_eq!(best.paths, vec![vec![0, 1, 3, 2]]);
    }

    #[test]
    fn exhausted_budget_returns_partial_results() {
        let board = Board::classic();
        let mut snapshot = Snapshot::new();
        for id in 0..42 {
            snapshot.set(id, Some(1), 1);
        }
        snapshot.set(20, Some(0), 200);
        let owned = set(&[20]);
        let params = AttritionParams::default();
        let asia: BTreeSet<TerritoryId> = (16..28).collect();

        let outcome = WarpathSearch::new(&board, &snapshot, &asia, &owned, &params, 5).search(&[20]);
        assert!(outcome.exhausted);
        assert_eq!(outcome.remaining_budget, 0);

        let planner = Planner::new(&board, &snapshot, &owned, &params, 5);
        let outcome = planner.plan_from(&[20], &asia, 5);
        assert!(outcome.exhausted);
        let skipped = planner.plan_from(&[], &asia, 5);
        assert!(!skipped.exhausted);
        assert_eq!(skipped.remaining_budget, 5);

        let outcome = WarpathSearch::new(&board, &snapshot, &asia, &owned, &params, 200_000).search(&[20]);
        for plan in &outcome.solutions {
            for path in &plan.paths {
                assert_eq!(path[0], 20);
                assert!(is_connected_path(&board, path));
            }
        }
    }

    #[test]
    fn starting_territories_need_troops() {
        let board = board_from_edges(&[(0, &[1]), (5, &[1]), (1, &[2]), (2, &[])]);
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 2);
        snapshot.set(5, Some(0), 3);
        snapshot.set(1, Some(1), 1);
        snapshot.set(2, Some(1), 1);
        assert_eq!(starting_territories(&board, &snapshot, &set(&[1, 2]), 0, 3), set(&[5]));
    }

    #[test]
    fn ideal_endings_exclude_owned() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[3]), (3, &[])]);
        assert_eq!(ideal_ending_points(&board, &set(&[1, 2]), &set(&[0])), set(&[1, 2]));
        assert_eq!(ideal_ending_points(&board, &set(&[1, 2]), &set(&[0, 1])), set(&[2]));
    }
}
