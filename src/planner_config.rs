use crate::board::Board;
use crate::combat::AttritionParams;
use crate::error::PlannerError;
use crate::region::Region;
use crate::territory::TerritoryId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Agent configuration: the region capture order and every tuning knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub tuning: Tuning,
}

/// A priority region built from whole continents plus loose territories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    #[serde(default)]
    pub continents: Vec<String>,
    #[serde(default)]
    pub territories: Vec<TerritoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
    pub attrition: AttritionParams,
    /// Extra margin on the strength gate before the attack handler plans.
    pub attack_margin: f64,
    /// Weight of hostile neighbour troops in the threat score.
    pub threat_factor: f64,
    pub threat_margin: f64,
    /// Multiplier on a planned path's troop shortfall when reinforcing its anchor.
    pub shortfall_factor: f64,
    /// Minimum troops for a territory to anchor an attack path.
    pub min_anchor_troops: u32,
    /// Node budget of one attack planning call.
    pub search_budget: usize,
    /// Node budget of the reinforcement escalation, split across anchor combinations.
    pub distribution_budget: usize,
    pub eliminate_check: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            attrition: AttritionParams::default(),
            attack_margin: 1.0,
            threat_factor: 1.25,
            threat_margin: 2.0,
            shortfall_factor: 1.25,
            min_anchor_troops: 3,
            search_budget: 10_000,
            distribution_budget: 20_000,
            eliminate_check: true,
        }
    }
}

impl BotConfig {
    /// Region priority used on the classic map.
    pub fn classic() -> Self {
        let config_data = include_str!("classic_regions.json");
        serde_json::from_str(config_data).expect("Unable to parse bundled region priority")
    }

    pub fn load_from_file(filename: &str) -> Result<Self, PlannerError> {
        let data = std::fs::read_to_string(filename)?;
        let config: BotConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Resolves the configured regions against `board`, in priority order.
    pub fn priority_regions(&self, board: &Board) -> Result<Vec<Region>, PlannerError> {
        self.regions
            .iter()
            .map(|region_config| {
                let mut territories = BTreeSet::new();
                for continent in &region_config.continents {
                    let continent = board
                        .get_continent(continent)
                        .ok_or_else(|| PlannerError::UnknownContinent(continent.clone()))?;
                    territories.extend(continent.territories.iter().copied());
                }
                for &territory in &region_config.territories {
                    if !board.contains(territory) {
                        return Err(PlannerError::UnknownTerritory(territory));
                    }
                    territories.insert(territory);
                }
                Ok(Region::new(&region_config.name, territories))
            })
            .collect()
    }
}
