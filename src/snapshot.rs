use crate::board::Board;
use crate::error::PlannerError;
use crate::territory::{PlayerId, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerritoryState {
    pub occupier: Option<PlayerId>,
    pub troops: u32,
}

/// Per-turn ownership and troop counts, supplied by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "Vec<TerritorySnapshot>", into = "Vec<TerritorySnapshot>")]
pub struct Snapshot {
    pub territories: BTreeMap<TerritoryId, TerritoryState>,
}

/// Wire form of one snapshot entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritorySnapshot {
    pub territory: TerritoryId,
    pub occupier: Option<PlayerId>,
    pub troops: u32,
}

impl From<Vec<TerritorySnapshot>> for Snapshot {
    fn from(entries: Vec<TerritorySnapshot>) -> Self {
        let mut snapshot = Snapshot::new();
        for entry in entries {
            snapshot.set(entry.territory, entry.occupier, entry.troops);
        }
        snapshot
    }
}

impl From<Snapshot> for Vec<TerritorySnapshot> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot
            .territories
            .into_iter()
            .map(|(territory, state)| TerritorySnapshot {
                territory,
                occupier: state.occupier,
                troops: state.troops,
            })
            .collect()
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, territory: TerritoryId, occupier: Option<PlayerId>, troops: u32) {
        self.territories
            .insert(territory, TerritoryState { occupier, troops });
    }

    pub fn state(&self, territory: TerritoryId) -> &TerritoryState {
        match self.territories.get(&territory) {
            Some(state) => state,
            None => panic!("Territory {} missing from snapshot", territory),
        }
    }

    pub fn troops(&self, territory: TerritoryId) -> u32 {
        self.state(territory).troops
    }

    pub fn occupier(&self, territory: TerritoryId) -> Option<PlayerId> {
        self.state(territory).occupier
    }

    pub fn is_owned_by(&self, territory: TerritoryId, player: PlayerId) -> bool {
        self.occupier(territory) == Some(player)
    }

    pub fn territories_owned_by(&self, player: PlayerId) -> BTreeSet<TerritoryId> {
        self.territories
            .iter()
            .filter(|(_, state)| state.occupier == Some(player))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Every player holding at least one territory, ascending.
    pub fn players(&self) -> BTreeSet<PlayerId> {
        self.territories
            .values()
            .filter_map(|state| state.occupier)
            .collect()
    }

    pub fn total_troops<'a>(&self, territories: impl IntoIterator<Item = &'a TerritoryId>) -> u32 {
        territories.into_iter().map(|&t| self.troops(t)).sum()
    }

    /// Checks that the snapshot describes exactly the territories on `board`.
    pub fn validate(&self, board: &Board) -> Result<(), PlannerError> {
        if let Some(&unknown) = self.territories.keys().find(|&&t| !board.contains(t)) {
            return Err(PlannerError::UnknownTerritory(unknown));
        }
        if let Some(&missing) = board
            .territories
            .keys()
            .find(|t| !self.territories.contains_key(t))
        {
            return Err(PlannerError::MissingTerritory(missing));
        }
        Ok(())
    }
}
