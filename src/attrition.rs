//! Exact battle outcomes from the dice Markov chain, and the least-squares fit
//! of the closed-form attrition estimate against them.

use crate::combat::AttritionParams;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// Probability that one roll ends with the defender losing every compared die
// (ATTACKER_WINS), the attacker losing every compared die (DEFENDER_WINS), or
// one each (SPLIT). Indexed [defender_dice - 1][attacker_dice - 1].
const ATTACKER_WINS: [[f64; 3]; 2] = [
    [15.0 / 36.0, 125.0 / 216.0, 855.0 / 1296.0],
    [55.0 / 216.0, 295.0 / 1296.0, 2890.0 / 7776.0],
];
const DEFENDER_WINS: [[f64; 3]; 2] = [
    [21.0 / 36.0, 91.0 / 216.0, 441.0 / 1296.0],
    [161.0 / 216.0, 581.0 / 1296.0, 2275.0 / 7776.0],
];
const SPLIT: [[f64; 3]; 2] = [[0.0, 0.0, 0.0], [0.0, 420.0 / 1296.0, 2611.0 / 7776.0]];

/// Attacker win probability and expected surviving movable troops for every
/// battle up to `max_attackers` troops on the attacking territory against
/// `max_defenders` defenders. Indexed `[attackers][defenders]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurvivorTable {
    pub max_attackers: u32,
    pub max_defenders: u32,
    pub win_probability: Vec<Vec<f64>>,
    /// Expected troops on the attacking territory at the end of the battle,
    /// minus the one that has to stay behind.
    pub expected_survivors: Vec<Vec<f64>>,
}

impl SurvivorTable {
    /// Fills the table bottom-up: every roll removes at least one troop, so a
    /// state only depends on states with fewer attackers or defenders.
    pub fn compute(max_attackers: u32, max_defenders: u32) -> Self {
        let rows = max_attackers as usize + 1;
        let cols = max_defenders as usize + 1;
        let mut win = vec![vec![0.0; cols]; rows];
        let mut survivors = vec![vec![0.0; cols]; rows];

        for a in 0..rows {
            for d in 0..cols {
                if a <= 1 {
                    continue;
                }
                if d == 0 {
                    win[a][d] = 1.0;
                    survivors[a][d] = (a - 1) as f64;
                    continue;
                }
                let attacker_dice = (a - 1).min(3);
                let defender_dice = d.min(2);
                let p_attacker = ATTACKER_WINS[defender_dice - 1][attacker_dice - 1];
                let p_defender = DEFENDER_WINS[defender_dice - 1][attacker_dice - 1];
                let p_split = SPLIT[defender_dice - 1][attacker_dice - 1];

                let (a_win, d_win) = if attacker_dice.min(defender_dice) == 2 {
                    ((a, d - 2), (a.saturating_sub(2), d))
                } else {
                    ((a, d - 1), (a - 1, d))
                };

                let mut w = p_attacker * win[a_win.0][a_win.1] + p_defender * win[d_win.0][d_win.1];
                let mut s = p_attacker * survivors[a_win.0][a_win.1]
                    + p_defender * survivors[d_win.0][d_win.1];
                if p_split > 0.0 {
                    w += p_split * win[a - 1][d - 1];
                    s += p_split * survivors[a - 1][d - 1];
                }
                win[a][d] = w;
                survivors[a][d] = s;
            }
        }

        Self {
            max_attackers,
            max_defenders,
            win_probability: win,
            expected_survivors: survivors,
        }
    }

    pub fn win_probability(&self, attackers: u32, defenders: u32) -> f64 {
        self.win_probability[attackers as usize][defenders as usize]
    }

    pub fn expected_survivors(&self, attackers: u32, defenders: u32) -> f64 {
        self.expected_survivors[attackers as usize][defenders as usize]
    }
}

/// Candidate values searched by [`fit_attrition`]. Only battles the attacker
/// is at least `min_win_probability` likely to win take part in the fit: those
/// are the ones the planner actually launches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitGrid {
    pub attrition_per_defender: Vec<f64>,
    pub loss_per_territory: Vec<f64>,
    pub min_win_probability: f64,
}

impl Default for FitGrid {
    fn default() -> Self {
        Self {
            attrition_per_defender: (0..=1000).map(|i| 0.5 + i as f64 * 0.001).collect(),
            loss_per_territory: (0..=40).map(|i| i as f64 * 0.05).collect(),
            min_win_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AttritionFit {
    pub attrition_per_defender: f64,
    pub loss_per_territory: f64,
    pub squared_error: f64,
    pub samples: usize,
}

impl AttritionFit {
    /// `params` with the fitted constants swapped in.
    pub fn apply(&self, params: AttritionParams) -> AttritionParams {
        AttritionParams {
            attrition_per_defender: self.attrition_per_defender,
            loss_per_territory: self.loss_per_territory,
            ..params
        }
    }
}

/// Battles used by the fit, as `(attackers, defenders, exact survivors)`.
fn samples(table: &SurvivorTable, min_win_probability: f64) -> Vec<(f64, f64, f64)> {
    let mut samples = vec![];
    for a in 2..=table.max_attackers {
        for d in 1..=table.max_defenders {
            if table.win_probability(a, d) >= min_win_probability {
                samples.push((a as f64, d as f64, table.expected_survivors(a, d)));
            }
        }
    }
    samples
}

fn sum_of_squares(samples: &[(f64, f64, f64)], k: f64, l: f64) -> f64 {
    samples
        .iter()
        .map(|&(a, d, exact)| {
            let diff = a - k * d - l - exact;
            diff * diff
        })
        .sum()
}

/// Sum of squared differences between the closed-form estimate for one
/// conquered territory and the exact table.
pub fn squared_error(table: &SurvivorTable, k: f64, l: f64, min_win_probability: f64) -> f64 {
    sum_of_squares(&samples(table, min_win_probability), k, l)
}

/// Grid search for the attrition constants minimising squared error. Returns
/// `None` when no battle qualifies for the fit.
pub fn fit_attrition(table: &SurvivorTable, grid: &FitGrid) -> Option<AttritionFit> {
    let samples = samples(table, grid.min_win_probability);
    if samples.is_empty() {
        return None;
    }

    let candidates: Vec<(f64, f64)> = grid
        .attrition_per_defender
        .iter()
        .flat_map(|&k| grid.loss_per_territory.iter().map(move |&l| (k, l)))
        .collect();

    candidates
        .par_iter()
        .map(|&(k, l)| AttritionFit {
            attrition_per_defender: k,
            loss_per_territory: l,
            squared_error: sum_of_squares(&samples, k, l),
            samples: samples.len(),
        })
        .min_by(|x, y| x.squared_error.total_cmp(&y.squared_error))
}
