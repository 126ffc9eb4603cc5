use crate::territory::TerritoryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("territory {0} is listed more than once")]
    DuplicateTerritory(TerritoryId),

    #[error("territory {from} lists unknown neighbour {to}")]
    UnknownNeighbour { from: TerritoryId, to: TerritoryId },

    #[error("adjacency between {0} and {1} is not symmetric")]
    AsymmetricAdjacency(TerritoryId, TerritoryId),

    #[error("continent '{continent}' references unknown territory {territory}")]
    UnknownContinentTerritory {
        continent: String,
        territory: TerritoryId,
    },

    #[error("unknown continent '{0}'")]
    UnknownContinent(String),

    #[error("unknown territory {0}")]
    UnknownTerritory(TerritoryId),

    #[error("snapshot is missing territory {0}")]
    MissingTerritory(TerritoryId),

    #[error("territory bonus needs {needed} troops but only {available} are available")]
    InsufficientTroops { needed: u32, available: u32 },

    #[error("no match has been started")]
    NoMatch,
}
