use crate::snapshot::Snapshot;
use crate::territory::TerritoryId;
use serde::{Deserialize, Serialize};

/// Calibration of the closed-form attrition estimate. The defaults approximate
/// three attacking dice against single defenders; `calibrate_attrition`
/// refits them against the exact survivor tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttritionParams {
    /// Attacking troops lost per defending troop (K).
    pub attrition_per_defender: f64,
    /// Troops left behind per conquered territory (L).
    pub loss_per_territory: f64,
    /// Per-territory term of the pre-search strength gate.
    pub gate_per_territory: f64,
    /// A path may only be extended while its estimate stays above this.
    pub feasibility_threshold: f64,
    /// An executing plan is recomputed once its weakest path drops to this.
    pub replan_threshold: f64,
}

impl Default for AttritionParams {
    fn default() -> Self {
        Self {
            attrition_per_defender: 0.857,
            loss_per_territory: 1.0,
            gate_per_territory: 1.0,
            feasibility_threshold: 1.0,
            replan_threshold: 2.0,
        }
    }
}

impl AttritionParams {
    /// Closed-form estimate from raw numbers.
    pub fn survivors(&self, attacker_troops: u32, defender_troops: u32, territories: usize) -> f64 {
        attacker_troops as f64
            - self.attrition_per_defender * defender_troops as f64
            - self.loss_per_territory * territories as f64
    }

    pub fn is_feasible(&self, estimate: f64) -> bool {
        estimate > self.feasibility_threshold
    }

    pub fn needs_replan(&self, estimate: f64) -> bool {
        estimate <= self.replan_threshold
    }

    /// Cheap necessary condition checked before any path-cover search.
    pub fn strength_gate(&self, starting_power: u32, enemy_power: u32, enemy_territories: usize) -> bool {
        starting_power as f64
            > self.attrition_per_defender * enemy_power as f64
                + self.gate_per_territory * enemy_territories as f64
    }
}

/// Expected troops left on the tip of `path` after pushing an attack from
/// `path[0]` through every following territory.
pub fn estimated_survivors(path: &[TerritoryId], snapshot: &Snapshot, params: &AttritionParams) -> f64 {
    let attacker = snapshot.troops(path[0]);
    let defenders = &path[1..];
    params.survivors(attacker, snapshot.total_troops(defenders), defenders.len())
}
