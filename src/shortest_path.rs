use crate::board::Board;
use crate::territory::TerritoryId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Breadth-first route from `source` to the nearest member of `targets`.
///
/// The route excludes `source` and ends on the target, so its length is the
/// hop distance. Empty when `source` is already a target or no target can be
/// reached.
pub fn shortest_path(
    board: &Board,
    source: TerritoryId,
    targets: &BTreeSet<TerritoryId>,
) -> Vec<TerritoryId> {
    assert!(board.contains(source), "Unknown territory id {}", source);
    if targets.contains(&source) {
        return vec![];
    }

    let mut parent: BTreeMap<TerritoryId, TerritoryId> = BTreeMap::new();
    let mut queue = VecDeque::from([source]);
    let mut found = None;

    'search: while let Some(current) = queue.pop_front() {
        for &neighbour in board.adjacent_to(current) {
            if neighbour == source || parent.contains_key(&neighbour) {
                continue;
            }
            parent.insert(neighbour, current);
            if targets.contains(&neighbour) {
                found = Some(neighbour);
                break 'search;
            }
            queue.push_back(neighbour);
        }
    }

    let mut path = Vec::new();
    let mut current = match found {
        Some(target) => target,
        None => return path,
    };
    while current != source {
        path.push(current);
        current = parent[&current];
    }
    path.reverse();
    path
}
