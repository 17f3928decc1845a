//! Line graph clustering.
//!
//! Uses a union-find data structure to group growth lines that are linked,
//! directly or through other lines, into connected components.

use crate::linking::LinkPolicy;
use aerogrowth_core::{EventConfig, GrowthLine};
use std::collections::BTreeMap;

/// Union-Find data structure for connected component detection.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);

        if px == py {
            return;
        }

        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Groups `lines` into connected components under `policy`.
///
/// Components are returned as index lists. Each list is ascending, and the
/// lists are ordered by their smallest index, so the output depends only on
/// the input order.
pub fn connected_components<P: LinkPolicy + ?Sized>(
    lines: &[GrowthLine],
    policy: &P,
    config: &EventConfig,
) -> Vec<Vec<usize>> {
    if lines.is_empty() {
        return Vec::new();
    }

    let n = lines.len();
    let mut uf = UnionFind::new(n);

    for i in 0..n {
        for j in (i + 1)..n {
            if policy.links(&lines[i], &lines[j], config) {
                uf.union(i, j);
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        let root = uf.find(i);
        components.entry(root).or_default().push(i);
    }

    let mut components: Vec<Vec<usize>> = components.into_values().collect();
    components.sort_by_key(|indices| indices[0]);
    components
}
