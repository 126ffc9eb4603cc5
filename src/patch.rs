//! Greedy reconnaissance paths over the enemy holes in a region.
//!
//! Unlike the warpath search this never fails on a connected hole: every enemy
//! territory ends up on some path. The paths say nothing about whether the
//! anchors can afford them.

use crate::board::Board;
use crate::components::connected_components;
use crate::region::Region;
use crate::snapshot::Snapshot;
use crate::territory::{Path, PlayerId, TerritoryId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

type Adjacency = BTreeMap<TerritoryId, BTreeSet<TerritoryId>>;

/// Paths from `friendly` anchors covering every `enemy` territory reachable
/// from one of them.
pub fn patch_holes(
    board: &Board,
    snapshot: &Snapshot,
    friendly: &BTreeSet<TerritoryId>,
    enemy: &BTreeSet<TerritoryId>,
) -> Vec<Path> {
    let enemy_graph = board.subgraph(enemy);
    let mut paths = vec![];

    for component in connected_components(&enemy_graph) {
        let anchors: BTreeSet<TerritoryId> = friendly
            .iter()
            .copied()
            .filter(|&f| board.adjacent_to(f).iter().any(|n| component.contains(n)))
            .collect();
        let anchor = match choose_anchor(board, snapshot, &enemy_graph, &component, &anchors) {
            Some(anchor) => anchor,
            None => {
                debug!(territories = ?component, "hole has no friendly neighbour, skipping");
                continue;
            }
        };
        paths.extend(cover_component(board, &enemy_graph, &component, anchor));
    }
    paths
}

fn choose_anchor(
    board: &Board,
    snapshot: &Snapshot,
    enemy_graph: &Adjacency,
    component: &BTreeSet<TerritoryId>,
    anchors: &BTreeSet<TerritoryId>,
) -> Option<TerritoryId> {
    let endpoints: BTreeSet<TerritoryId> = component
        .iter()
        .copied()
        .filter(|t| enemy_graph[t].len() == 1)
        .collect();

    // max_by_key keeps the last maximum, so walk ids in descending order to
    // let the smallest id win remaining ties.
    anchors.iter().rev().copied().max_by_key(|&a| {
        let touches_endpoint = board.adjacent_to(a).iter().any(|n| endpoints.contains(n));
        (snapshot.troops(a), touches_endpoint)
    })
}

/// Number of `t`'s component neighbours still unvisited.
fn open_degree(enemy_graph: &Adjacency, visited: &BTreeSet<TerritoryId>, t: TerritoryId) -> usize {
    enemy_graph[&t]
        .iter()
        .filter(|n| !visited.contains(n))
        .count()
}

fn cover_component(
    board: &Board,
    enemy_graph: &Adjacency,
    component: &BTreeSet<TerritoryId>,
    anchor: TerritoryId,
) -> Vec<Path> {
    let mut visited = BTreeSet::new();
    let mut splitting_points: Vec<(TerritoryId, TerritoryId)> = vec![];
    let mut paths = vec![];

    let entries: Vec<TerritoryId> = board
        .adjacent_to(anchor)
        .iter()
        .copied()
        .filter(|n| component.contains(n))
        .collect();
    let first = match entries
        .iter()
        .copied()
        .min_by_key(|&t| (enemy_graph[&t].len(), t))
    {
        Some(first) => first,
        None => return paths,
    };
    splitting_points.extend(
        entries
            .iter()
            .rev()
            .filter(|&&t| t != first)
            .map(|&t| (anchor, t)),
    );

    let mut fragment = vec![anchor, first];
    visited.insert(first);
    loop {
        let tail = fragment[fragment.len() - 1];
        let next = enemy_graph[&tail]
            .iter()
            .copied()
            .filter(|n| !visited.contains(n))
            .min_by_key(|&n| (open_degree(enemy_graph, &visited, n), n));

        match next {
            Some(next) => {
                for &other in enemy_graph[&tail].iter().rev() {
                    if other != next && !visited.contains(&other) {
                        splitting_points.push((tail, other));
                    }
                }
                visited.insert(next);
                fragment.push(next);
            }
            None => {
                paths.push(std::mem::take(&mut fragment));
                loop {
                    match splitting_points.pop() {
                        Some((from, to)) if !visited.contains(&to) => {
                            visited.insert(to);
                            fragment = vec![from, to];
                            break;
                        }
                        Some(_) => continue,
                        None => return paths,
                    }
                }
            }
        }
    }
}

/// Reconnaissance paths for a region we held last update and have since been
/// breached in.
pub fn retaking_paths(board: &Board, snapshot: &Snapshot, me: PlayerId, region: &Region) -> Vec<Path> {
    let owned = snapshot.territories_owned_by(me);
    let enemy: BTreeSet<TerritoryId> = region.territories.difference(&owned).copied().collect();
    let friendly: BTreeSet<TerritoryId> = board
        .border_territories(&owned)
        .into_iter()
        .filter(|&t| board.adjacent_to(t).iter().any(|n| enemy.contains(n)))
        .collect();
    patch_holes(board, snapshot, &friendly, &enemy)
}
