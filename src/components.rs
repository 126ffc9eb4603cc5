use crate::territory::TerritoryId;
use std::collections::{BTreeMap, BTreeSet};

/// Union-find over a dense index space.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parents: Vec<usize>,
    sizes: Vec<usize>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parents: (0..len).collect(),
            sizes: vec![1; len],
        }
    }

    pub fn find(&mut self, item: usize) -> usize {
        let mut root = item;
        while self.parents[root] != root {
            root = self.parents[root];
        }
        let mut current = item;
        while self.parents[current] != root {
            let next = self.parents[current];
            self.parents[current] = root;
            current = next;
        }
        root
    }

    /// Merges the sets holding `a` and `b`; false when they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }
        if self.sizes[a] < self.sizes[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parents[b] = a;
        self.sizes[a] += self.sizes[b];
        true
    }
}

/// Connected components of `subgraph`, sorted by their smallest vertex.
/// Edges leading outside the key set are ignored.
pub fn connected_components(
    subgraph: &BTreeMap<TerritoryId, BTreeSet<TerritoryId>>,
) -> Vec<BTreeSet<TerritoryId>> {
    let index: BTreeMap<TerritoryId, usize> = subgraph
        .keys()
        .enumerate()
        .map(|(i, &vertex)| (vertex, i))
        .collect();
    let mut sets = DisjointSet::new(index.len());

    for (start, neighbours) in subgraph {
        for end in neighbours {
            if let Some(&end_index) = index.get(end) {
                sets.union(index[start], end_index);
            }
        }
    }

    let mut components: BTreeMap<usize, BTreeSet<TerritoryId>> = BTreeMap::new();
    for (&vertex, &i) in &index {
        let root = sets.find(i);
        components.entry(root).or_default().insert(vertex);
    }

    let mut components: Vec<BTreeSet<TerritoryId>> = components.into_values().collect();
    components.sort_by_key(|component| component.iter().next().copied());
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(TerritoryId, &[TerritoryId])]) -> BTreeMap<TerritoryId, BTreeSet<TerritoryId>> {
        edges
            .iter()
            .map(|&(v, ns)| (v, ns.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn splits_disconnected_pieces() {
        let g = graph(&[(5, &[6]), (6, &[5]), (1, &[]), (3, &[4]), (4, &[3])]);
        let components = connected_components(&g);
        assert_eq!(
            components,
            vec![
                [1].into_iter().collect(),
                [3, 4].into_iter().collect(),
                [5, 6].into_iter().collect(),
            ]
        );
    }

    #[test]
    fn ignores_edges_outside_vertex_set() {
        let g = graph(&[(0, &[9]), (1, &[9])]);
        assert_eq!(connected_components(&g).len(), 2);
    }

    #[test]
    fn one_directional_edges_still_join() {
        let g = graph(&[(0, &[1]), (1, &[]), (2, &[1])]);
        assert_eq!(connected_components(&g), vec![[0, 1, 2].into_iter().collect()]);
    }

    #[test]
    fn empty_graph_has_no_components() {
        assert!(connected_components(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn union_reports_merges() {
        let mut sets = DisjointSet::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(sets.union(1, 3));
        assert!(!sets.union(0, 2));
        assert_eq!(sets.find(0), sets.find(3));
    }
}
