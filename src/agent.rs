use crate::board::Board;
use crate::combat::estimated_survivors;
use crate::error::PlannerError;
use crate::patch;
use crate::plan::Plan;
use crate::planner_config::{BotConfig, Tuning};
use crate::region::{compute_focus, eliminate_override, update_focus, Focus, Region, RegionState};
use crate::shortest_path::shortest_path;
use crate::snapshot::Snapshot;
use crate::territory::{Path, PlayerId, TerritoryId};
use crate::warpath::{starting_territories, Planner};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

/// Answers to the engine's queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Move {
    Attack {
        from: TerritoryId,
        to: TerritoryId,
        troops: u32,
    },
    AttackPass,
    TroopsAfterAttack {
        troops: u32,
    },
    Defend {
        troops: u32,
    },
    Fortify {
        from: TerritoryId,
        to: TerritoryId,
        troops: u32,
    },
    FortifyPass,
    DistributeTroops {
        distribution: BTreeMap<TerritoryId, u32>,
    },
}

/// Everything the agent remembers between queries of one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlannerState {
    pub region_states: Vec<RegionState>,
    pub focus: Focus,
    pub attack_plan: Plan,
    /// Set after reinforcing: the next attack query plans from scratch.
    pub replan_pending: bool,
    /// Opponent currently targeted for elimination, if any.
    pub eliminating: Option<PlayerId>,
}

/// Adds up to `troops` troops on `territory`, never more than `remaining`.
fn place(
    distribution: &mut BTreeMap<TerritoryId, u32>,
    remaining: &mut u32,
    territory: TerritoryId,
    troops: u32,
) {
    let troops = troops.min(*remaining);
    if troops > 0 {
        *distribution.entry(territory).or_insert(0) += troops;
        *remaining -= troops;
    }
}

pub struct Agent {
    pub board: Board,
    pub player_id: PlayerId,
    pub regions: Vec<Region>,
    pub tuning: Tuning,
}

impl Agent {
    pub fn new(board: Board, player_id: PlayerId, config: &BotConfig) -> Result<Self, PlannerError> {
        let regions = config.priority_regions(&board)?;
        Ok(Self {
            board,
            player_id,
            regions,
            tuning: config.tuning.clone(),
        })
    }

    /// Classic map with the bundled region priority.
    pub fn classic(player_id: PlayerId) -> Result<Self, PlannerError> {
        Self::new(Board::classic(), player_id, &BotConfig::classic())
    }

    fn owned(&self, snapshot: &Snapshot) -> BTreeSet<TerritoryId> {
        snapshot.territories_owned_by(self.player_id)
    }

    /// Advances region states by one turn, then recomputes the focus. Runs on
    /// the turn's first query, the reinforcement phase.
    pub fn begin_turn(&self, state: &mut PlannerState, snapshot: &Snapshot) {
        let owned = self.owned(snapshot);
        let update = update_focus(&self.regions, &owned, &state.region_states);
        for (i, changed) in update.changed.iter().enumerate() {
            if *changed {
                info!(region = %self.regions[i].name, state = ?update.states[i], "region state changed");
            }
        }
        state.region_states = update.states;
        state.focus = update.focus;
        self.apply_eliminate_check(state, snapshot);
    }

    /// Recomputes the focus for a later query of the same turn. Region states
    /// stay as the turn began, unless no turn has begun yet.
    pub fn refresh_focus(&self, state: &mut PlannerState, snapshot: &Snapshot) {
        if state.region_states.len() != self.regions.len() {
            self.begin_turn(state, snapshot);
            return;
        }
        state.focus = compute_focus(&self.regions, &self.owned(snapshot));
        self.apply_eliminate_check(state, snapshot);
    }

    fn apply_eliminate_check(&self, state: &mut PlannerState, snapshot: &Snapshot) {
        state.eliminating = if self.tuning.eliminate_check {
            eliminate_override(&self.board, snapshot, self.player_id, &mut state.focus)
        } else {
            None
        };
    }

    /// How badly `territory` needs reinforcing; positive means short of troops.
    pub fn threat(&self, snapshot: &Snapshot, territory: TerritoryId) -> f64 {
        let hostile: u32 = self
            .board
            .adjacent_to(territory)
            .iter()
            .filter(|&&n| !snapshot.is_owned_by(n, self.player_id))
            .map(|&n| snapshot.troops(n).saturating_sub(1))
            .sum();
        self.tuning.threat_factor * hostile as f64 + self.tuning.threat_margin
            - snapshot.troops(territory) as f64
    }

    /// Places exactly `troops` troops: the card bonus first, then threatened
    /// defensive borders, then the front line of the war focus.
    #[instrument(level = "info", skip_all, fields(player = self.player_id, troops = troops))]
    pub fn distribute_troops(
        &self,
        state: &mut PlannerState,
        snapshot: &Snapshot,
        troops: u32,
        bonus_territory: Option<TerritoryId>,
    ) -> BTreeMap<TerritoryId, u32> {
        self.begin_turn(state, snapshot);
        state.attack_plan.clear();
        state.replan_pending = true;

        let mut distribution: BTreeMap<TerritoryId, u32> = BTreeMap::new();
        let mut remaining = troops;
        if let Some(bonus) = bonus_territory {
            assert!(
                remaining >= 2,
                "Territory bonus needs 2 troops but only {} are available",
                remaining
            );
            place(&mut distribution, &mut remaining, bonus, 2);
        }

        let owned = self.owned(snapshot);
        let border = self.board.border_territories(&owned);

        let mut defensive: Vec<(TerritoryId, f64)> = border
            .intersection(&state.focus.defense_focus)
            .map(|&t| (t, self.threat(snapshot, t)))
            .collect();
        defensive.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (territory, threat) in defensive {
            if remaining == 0 {
                break;
            }
            let wanted = threat.round();
            if wanted > 0.0 {
                debug!(territory, threat, "reinforcing defensive border");
                place(&mut distribution, &mut remaining, territory, wanted as u32);
            }
        }
        if remaining == 0 {
            return distribution;
        }

        let enemy: BTreeSet<TerritoryId> = state.focus.war_focus.difference(&owned).copied().collect();
        let front_line: BTreeSet<TerritoryId> = self
            .board
            .adjacent_to_region(&enemy)
            .intersection(&owned)
            .copied()
            .collect();

        if front_line.len() == 1 {
            if let Some(&only) = front_line.iter().next() {
                debug!(territory = only, "single front line takes the rest");
                let all = remaining;
                place(&mut distribution, &mut remaining, only, all);
            }
            return distribution;
        }

        if !front_line.is_empty() {
            let planner = Planner::new(
                &self.board,
                snapshot,
                &owned,
                &self.tuning.attrition,
                self.tuning.distribution_budget,
            )
            .coverage_only();
            if let Some(plan) = planner.plan_escalating(&front_line, &state.focus.war_focus) {
                for path in &plan.paths {
                    let shortfall = -estimated_survivors(path, snapshot, &self.tuning.attrition);
                    let needed = (shortfall * self.tuning.shortfall_factor).round();
                    if needed >= 1.0 {
                        debug!(anchor = path[0], needed, "topping up attack anchor");
                        place(&mut distribution, &mut remaining, path[0], needed as u32);
                    }
                }
            }
        }

        if remaining > 0 {
            let spread: Vec<TerritoryId> = if border.is_empty() {
                owned.iter().copied().collect()
            } else {
                border.iter().copied().collect()
            };
            match spread.first() {
                Some(&first) => {
                    let each = remaining / spread.len() as u32;
                    let leftover = remaining % spread.len() as u32;
                    for &t in &spread {
                        place(&mut distribution, &mut remaining, t, each);
                    }
                    place(&mut distribution, &mut remaining, first, leftover);
                }
                None => warn!(remaining, "no territory to place troops on"),
            }
        }

        distribution
    }

    fn replan(&self, state: &mut PlannerState, snapshot: &Snapshot, owned: &BTreeSet<TerritoryId>) {
        let target = state.focus.war_focus.clone();
        let anchors = starting_territories(
            &self.board,
            snapshot,
            &target,
            self.player_id,
            self.tuning.min_anchor_troops,
        );
        let planner = Planner::new(
            &self.board,
            snapshot,
            owned,
            &self.tuning.attrition,
            self.tuning.search_budget,
        );
        state.attack_plan = planner.best_plan(&anchors, &target).unwrap_or_default();
        info!(paths = ?state.attack_plan.paths, "attack plan computed");
    }

    /// True when our troops on and around the war focus clearly outweigh the
    /// enemy inside it.
    fn worth_planning(&self, snapshot: &Snapshot, owned: &BTreeSet<TerritoryId>, war_focus: &BTreeSet<TerritoryId>) -> bool {
        let enemy: BTreeSet<TerritoryId> = war_focus.difference(owned).copied().collect();
        if enemy.is_empty() {
            return false;
        }
        let border = self.board.border_territories(owned);
        let my_power = snapshot.total_troops(owned.iter().filter(|t| war_focus.contains(*t) || border.contains(*t)));
        let params = &self.tuning.attrition;
        my_power as f64
            > params.attrition_per_defender * snapshot.total_troops(&enemy) as f64
                + params.gate_per_territory * enemy.len() as f64
                + self.tuning.attack_margin
    }

    #[instrument(level = "info", skip_all, fields(player = self.player_id))]
    pub fn attack(&self, state: &mut PlannerState, snapshot: &Snapshot) -> Move {
        self.refresh_focus(state, snapshot);
        let owned = self.owned(snapshot);
        let params = &self.tuning.attrition;

        if state.replan_pending {
            state.replan_pending = false;
            self.replan(state, snapshot, &owned);
        } else if !state.attack_plan.is_empty() {
            let stale = state.attack_plan.is_stale(snapshot, self.player_id);
            let weakest = state.attack_plan.min_estimated_survivors(snapshot, params);
            if stale || weakest.map_or(true, |w| params.needs_replan(w)) {
                debug!(stale, ?weakest, "replanning attack");
                self.replan(state, snapshot, &owned);
            }
        } else if self.worth_planning(snapshot, &owned, &state.focus.war_focus) {
            self.replan(state, snapshot, &owned);
        }

        match state.attack_plan.next_attack() {
            Some((from, to)) if snapshot.troops(from) > 1 => Move::Attack {
                from,
                to,
                troops: (snapshot.troops(from) - 1).min(3),
            },
            Some((from, _)) => {
                warn!(from, "attack plan anchor has no troops to spare, dropping plan");
                state.attack_plan.clear();
                Move::AttackPass
            }
            None => Move::AttackPass,
        }
    }

    /// Moves everything but one troop into the conquered territory.
    pub fn troops_after_attack(
        &self,
        state: &mut PlannerState,
        snapshot: &Snapshot,
        attacking_territory: TerritoryId,
    ) -> Move {
        if !state.attack_plan.advance(attacking_territory) {
            warn!(attacking_territory, "conquest was not on the attack plan, dropping plan");
            state.attack_plan.clear();
        }
        Move::TroopsAfterAttack {
            troops: snapshot.troops(attacking_territory).saturating_sub(1),
        }
    }

    pub fn defend(&self, snapshot: &Snapshot, defending_territory: TerritoryId) -> Move {
        Move::Defend {
            troops: snapshot.troops(defending_territory).min(2),
        }
    }

    /// Walks the largest interior stack one step towards the nearest border.
    pub fn fortify(&self, snapshot: &Snapshot) -> Move {
        let owned = self.owned(snapshot);
        let border = self.board.border_territories(&owned);
        let stack = owned
            .difference(&border)
            .copied()
            .max_by_key(|&t| (snapshot.troops(t), Reverse(t)));

        let from = match stack {
            Some(from) if snapshot.troops(from) > 1 => from,
            _ => return Move::FortifyPass,
        };
        match shortest_path(&self.board, from, &border).first() {
            Some(&to) => Move::Fortify {
                from,
                to,
                troops: snapshot.troops(from) - 1,
            },
            None => Move::FortifyPass,
        }
    }

    /// Reconnaissance paths for every region breached since we last held it.
    pub fn retaking_paths(&self, state: &PlannerState, snapshot: &Snapshot) -> Vec<Path> {
        self.regions
            .iter()
            .zip(&state.region_states)
            .filter(|(_, region_state)| **region_state == RegionState::Retaking)
            .flat_map(|(region, _)| patch::retaking_paths(&self.board, snapshot, self.player_id, region))
            .collect()
    }
}
