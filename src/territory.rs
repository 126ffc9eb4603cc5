use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type TerritoryId = usize;
pub type PlayerId = usize;

/// An ordered chain of territories: the anchor first, then the targets in the
/// order they are to be conquered.
pub type Path = Vec<TerritoryId>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub continent: String,
    pub adjacent_territories: BTreeSet<TerritoryId>,
}

impl Territory {
    pub fn new(id: TerritoryId, name: &str, continent: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            continent: continent.to_string(),
            adjacent_territories: BTreeSet::new(),
        }
    }

    pub fn add_adjacent(&mut self, adjacent: TerritoryId) {
        self.adjacent_territories.insert(adjacent);
    }

    pub fn is_adjacent(&self, territory: TerritoryId) -> bool {
        self.adjacent_territories.contains(&territory)
    }
}

/// True when every consecutive pair of `path` is adjacent on the board.
pub fn is_connected_path(board: &crate::board::Board, path: &[TerritoryId]) -> bool {
    path.windows(2)
        .all(|pair| board.get_territory(pair[0]).map_or(false, |t| t.is_adjacent(pair[1])))
}
