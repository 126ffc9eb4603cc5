use crate::board::Board;
use crate::snapshot::Snapshot;
use crate::territory::{PlayerId, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A named, static set of territories: a continent or an ad hoc grouping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub name: String,
    pub territories: BTreeSet<TerritoryId>,
}

impl Region {
    pub fn new(name: &str, territories: BTreeSet<TerritoryId>) -> Self {
        Self {
            name: name.to_string(),
            territories,
        }
    }

    pub fn is_controlled_by(&self, owned: &BTreeSet<TerritoryId>) -> bool {
        self.territories.is_subset(owned)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RegionState {
    #[default]
    Enemy,
    Friendly,
    /// Held in full last update, breached now.
    Retaking,
}

impl RegionState {
    pub fn next(previous: RegionState, region: &Region, owned: &BTreeSet<TerritoryId>) -> Self {
        if region.is_controlled_by(owned) {
            RegionState::Friendly
        } else if previous == RegionState::Friendly {
            RegionState::Retaking
        } else {
            RegionState::Enemy
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Focus {
    /// Territories currently targeted for conquest.
    pub war_focus: BTreeSet<TerritoryId>,
    /// Territories worth reinforcing while attacking elsewhere.
    pub defense_focus: BTreeSet<TerritoryId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusUpdate {
    pub states: Vec<RegionState>,
    /// Whether each region's state differs from the previous update.
    pub changed: Vec<bool>,
    pub focus: Focus,
}

/// Advances region states by one turn and recomputes the war/defense focus.
///
/// `previous` is indexed like `regions`; missing entries count as `Enemy`.
pub fn update_focus(
    regions: &[Region],
    owned: &BTreeSet<TerritoryId>,
    previous: &[RegionState],
) -> FocusUpdate {
    let states: Vec<RegionState> = regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let before = previous.get(i).copied().unwrap_or_default();
            RegionState::next(before, region, owned)
        })
        .collect();
    let changed = states
        .iter()
        .enumerate()
        .map(|(i, state)| previous.get(i).copied().unwrap_or_default() != *state)
        .collect();

    FocusUpdate {
        states,
        changed,
        focus: compute_focus(regions, owned),
    }
}

/// War and defense focus from ownership alone; region states play no part.
pub fn compute_focus(regions: &[Region], owned: &BTreeSet<TerritoryId>) -> Focus {
    let mut focus = Focus::default();
    match regions.iter().position(|region| !region.is_controlled_by(owned)) {
        Some(war_index) => {
            focus.war_focus = regions[war_index].territories.clone();
            for (i, region) in regions.iter().enumerate() {
                if i != war_index {
                    focus.defense_focus.extend(region.territories.iter().copied());
                }
            }
        }
        None => {
            for region in regions {
                focus.defense_focus.extend(region.territories.iter().copied());
            }
        }
    }

    focus
}

/// Switches the war focus onto an opponent whose every territory touches ours.
/// Returns the opponent when the override fired.
pub fn eliminate_override(
    board: &Board,
    snapshot: &Snapshot,
    me: PlayerId,
    focus: &mut Focus,
) -> Option<PlayerId> {
    let mine = snapshot.territories_owned_by(me);
    let adjacent_to_me = board.adjacent_to_region(&mine);

    for player in snapshot.players() {
        if player == me {
            continue;
        }
        let theirs = snapshot.territories_owned_by(player);
        if !theirs.is_empty() && theirs.is_subset(&adjacent_to_me) {
            debug!(player, territories = ?theirs, "opponent within reach, focusing elimination");
            focus.war_focus = theirs;
            focus.defense_focus.clear();
            return Some(player);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_from_edges;

    fn set(ids: &[TerritoryId]) -> BTreeSet<TerritoryId> {
        ids.iter().copied().collect()
    }

    fn regions() -> Vec<Region> {
        vec![
            Region::new("a", set(&[0, 1])),
            Region::new("b", set(&[2, 3])),
            Region::new("c", set(&[4])),
        ]
    }

    #[test]
    fn first_uncontrolled_region_is_war_focus() {
        let update = update_focus(&regions(), &set(&[0, 1, 3]), &[]);
        assert_eq!(update.focus.war_focus, set(&[2, 3]));
        assert_eq!(update.focus.defense_focus, set(&[0, 1, 4]));
        assert_eq!(
            update.states,
            vec![RegionState::Friendly, RegionState::Enemy, RegionState::Enemy]
        );
        assert_eq!(update.changed, vec![true, false, false]);
    }

    #[test]
    fn breach_then_loss() {
        let regions = regions();
        let held = update_focus(&regions, &set(&[0, 1]), &[]);
        let breached = update_focus(&regions, &set(&[0]), &held.states);
        assert_eq!(breached.states[0], RegionState::Retaking);
        assert!(breached.changed[0]);
        let lost = update_focus(&regions, &set(&[0]), &breached.states);
        assert_eq!(lost.states[0], RegionState::Enemy);
        let regained = update_focus(&regions, &set(&[0, 1]), &lost.states);
        assert_eq!(regained.states[0], RegionState::Friendly);
    }

    #[test]
    fn focus_ignores_region_states() {
        let regions = regions();
        let breached = update_focus(&regions, &set(&[0]), &[RegionState::Friendly]);
        assert_eq!(compute_focus(&regions, &set(&[0])), breached.focus);
        assert_eq!(breached.focus.war_focus, set(&[0, 1]));
    }

    #[test]
    fn everything_controlled_leaves_no_war_focus() {
        let update = update_focus(&regions(), &set(&[0, 1, 2, 3, 4]), &[]);
        assert!(update.focus.war_focus.is_empty());
        assert_eq!(update.focus.defense_focus, set(&[0, 1, 2, 3, 4]));
    }

    #[test]
    fn eliminate_override_targets_surrounded_player() {
        // 0 - 1 - 2 - 3
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[3]), (3, &[])]);
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 5);
        snapshot.set(1, Some(1), 1);
        snapshot.set(2, Some(0), 5);
        snapshot.set(3, Some(2), 4);

        let mut focus = Focus {
            war_focus: set(&[3]),
            defense_focus: set(&[0]),
        };
        assert_eq!(eliminate_override(&board, &snapshot, 0, &mut focus), Some(1));
        assert_eq!(focus.war_focus, set(&[1]));
        assert!(focus.defense_focus.is_empty());
    }

    #[test]
    fn eliminate_override_ignores_unreachable_players() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        let mut snapshot = Snapshot::new();
        snapshot.set(0, Some(0), 5);
        snapshot.set(1, Some(1), 1);
        snapshot.set(2, Some(1), 1);

        let mut focus = Focus::default();
        assert_eq!(eliminate_override(&board, &snapshot, 0, &mut focus), None);
        assert!(focus.war_focus.is_empty());
    }
}
