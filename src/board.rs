use crate::map_config::MapConfig;
use crate::region::Region;
use crate::territory::{Territory, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Static territory graph for one match. Owns connectivity only; ownership
/// and troop counts live in [`crate::snapshot::Snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Board {
    pub territories: BTreeMap<TerritoryId, Territory>,
    pub continents: BTreeMap<String, Region>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled 42 territory map.
    pub fn classic() -> Self {
        MapConfig::classic()
            .to_board()
            .expect("Bundled classic map is invalid")
    }

    pub fn add_territory(&mut self, territory: Territory) {
        self.territories.insert(territory.id, territory);
    }

    pub fn add_continent(&mut self, continent: Region) {
        self.continents.insert(continent.name.clone(), continent);
    }

    pub fn get_territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(&id)
    }

    pub fn get_continent(&self, name: &str) -> Option<&Region> {
        self.continents.get(name)
    }

    pub fn contains(&self, id: TerritoryId) -> bool {
        self.territories.contains_key(&id)
    }

    /// Neighbours of `id`.
    ///
    /// Panics on an unknown id: callers are expected to only pass ids taken
    /// from this board.
    pub fn adjacent_to(&self, id: TerritoryId) -> &BTreeSet<TerritoryId> {
        match self.territories.get(&id) {
            Some(territory) => &territory.adjacent_territories,
            None => panic!("Unknown territory id {}", id),
        }
    }

    /// Territories outside `region` that touch at least one territory inside it.
    pub fn adjacent_to_region(&self, region: &BTreeSet<TerritoryId>) -> BTreeSet<TerritoryId> {
        region
            .iter()
            .flat_map(|&t| self.adjacent_to(t).iter().copied())
            .filter(|t| !region.contains(t))
            .collect()
    }

    /// Owned territories with at least one neighbour that is not owned.
    pub fn border_territories(&self, owned: &BTreeSet<TerritoryId>) -> BTreeSet<TerritoryId> {
        owned
            .iter()
            .copied()
            .filter(|&t| self.adjacent_to(t).iter().any(|n| !owned.contains(n)))
            .collect()
    }

    /// Adjacency restricted to `vertices`.
    pub fn subgraph(
        &self,
        vertices: &BTreeSet<TerritoryId>,
    ) -> BTreeMap<TerritoryId, BTreeSet<TerritoryId>> {
        vertices
            .iter()
            .map(|&v| {
                let neighbours = self
                    .adjacent_to(v)
                    .iter()
                    .copied()
                    .filter(|n| vertices.contains(n))
                    .collect();
                (v, neighbours)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a board from an adjacency list, mirroring every edge.
    pub(crate) fn board_from_edges(edges: &[(TerritoryId, &[TerritoryId])]) -> Board {
        let mut board = Board::new();
        for &(id, _) in edges {
            board.add_territory(Territory::new(id, &format!("T{}", id), "test"));
        }
        for &(id, neighbours) in edges {
            for &n in neighbours {
                board.territories.get_mut(&id).unwrap().add_adjacent(n);
                board
                    .territories
                    .entry(n)
                    .or_insert_with(|| Territory::new(n, &format!("T{}", n), "test"))
                    .add_adjacent(id);
            }
        }
        board
    }

    fn set(ids: &[TerritoryId]) -> BTreeSet<TerritoryId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn adjacent_to_region_excludes_members() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[3]), (3, &[])]);
        assert_eq!(board.adjacent_to_region(&set(&[1, 2])), set(&[0, 3]));
    }

    #[test]
    fn border_territories_touch_foreign_land() {
        let board = board_from_edges(&[(0, &[1]), (1, &[2]), (2, &[])]);
        assert_eq!(board.border_territories(&set(&[0, 1])), set(&[1]));
        assert!(board.border_territories(&set(&[0, 1, 2])).is_empty());
    }

    #[test]
    fn subgraph_drops_outside_edges() {
        let board = board_from_edges(&[(0, &[1, 2]), (1, &[2]), (2, &[])]);
        let sub = board.subgraph(&set(&[0, 1]));
        assert_eq!(sub[&0], set(&[1]));
        assert_eq!(sub[&1], set(&[0]));
    }

    #[test]
    #[should_panic(expected = "Unknown territory id 7")]
    fn unknown_territory_panics() {
        let board = board_from_edges(&[(0, &[1])]);
        board.adjacent_to(7);
    }

    #[test]
    fn classic_map_symmetry() {
        let board = Board::classic();
        for territory in board.territories.values() {
            for &n in &territory.adjacent_territories {
                assert!(board.adjacent_to(n).contains(&territory.id));
            }
        }
        assert!(board.adjacent_to(21).contains(&0));
    }
}
