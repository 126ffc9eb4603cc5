use crate::board::Board;
use crate::error::PlannerError;
use crate::region::Region;
use crate::territory::{Territory, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Static map description: territories with their adjacency lists, and the
/// named continents grouping them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub territories: Vec<TerritoryConfig>,
    pub continents: Vec<ContinentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritoryConfig {
    pub id: TerritoryId,
    pub name: String,
    pub continent: String,
    pub adjacent_territories: Vec<TerritoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinentConfig {
    pub name: String,
    pub territories: Vec<TerritoryId>,
}

impl MapConfig {
    pub fn classic() -> Self {
        let config_data = include_str!("classic_map.json");
        serde_json::from_str(config_data).expect("Unable to parse bundled classic map")
    }

    pub fn load_from_file(filename: &str) -> Result<Self, PlannerError> {
        let data = std::fs::read_to_string(filename)?;
        let config: MapConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn to_board(&self) -> Result<Board, PlannerError> {
        let mut board = Board::new();

        for territory_config in &self.territories {
            if board.get_territory(territory_config.id).is_some() {
                return Err(PlannerError::DuplicateTerritory(territory_config.id));
            }
            let mut territory = Territory::new(
                territory_config.id,
                &territory_config.name,
                &territory_config.continent,
            );
            for &adjacent in &territory_config.adjacent_territories {
                territory.add_adjacent(adjacent);
            }
            board.add_territory(territory);
        }

        for territory in board.territories.values() {
            for &adjacent in &territory.adjacent_territories {
                let other = board
                    .get_territory(adjacent)
                    .ok_or(PlannerError::UnknownNeighbour {
                        from: territory.id,
                        to: adjacent,
                    })?;
                if !other.is_adjacent(territory.id) {
                    return Err(PlannerError::AsymmetricAdjacency(territory.id, adjacent));
                }
            }
        }

        for continent_config in &self.continents {
            let mut territories = BTreeSet::new();
            for &territory in &continent_config.territories {
                if board.get_territory(territory).is_none() {
                    return Err(PlannerError::UnknownContinentTerritory {
                        continent: continent_config.name.clone(),
                        territory,
                    });
                }
                territories.insert(territory);
            }
            board.add_continent(Region::new(&continent_config.name, territories));
        }

        Ok(board)
    }
}
