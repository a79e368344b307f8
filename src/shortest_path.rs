use std::cmp::Ordering;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use priority_queue::PriorityQueue;


/// Forward Dijkstra over a petgraph graph, using a decrease-key priority queue.  Based on the
/// implementation in the petgraph library, but keeps the edge used to reach each node so
/// that flow can be loaded back along the tree.
///
/// Returns a vector of path costs indexed by node (infinite if unreachable) and a vector of
/// the last edge on the shortest path to each node (None for the source and for unreachable
/// nodes).
pub fn shortest_path_tree<N, E, F>(graph: &DiGraph<N, E>, source: NodeIndex, edge_cost: F)
                                   -> (Vec<f64>, Vec<Option<EdgeIndex>>)
    where F: Fn(EdgeIndex) -> f64
{
    let mut costs = vec![f64::INFINITY; graph.node_count()];
    let mut pred_edges = vec![None; graph.node_count()];
    let mut settled = vec![false; graph.node_count()];
    costs[source.index()] = 0.;

    let mut queue = PriorityQueue::new();
    queue.push(source, MinScored(0., ()));
    while let Some((node, MinScored(node_cost, ()))) = queue.pop() {
        settled[node.index()] = true;
        for edge in graph.edges(node) {
            let next = edge.target();
            if settled[next.index()] {
                continue;
            }
            let next_cost = node_cost + edge_cost(edge.id());
            if next_cost < costs[next.index()] {
                costs[next.index()] = next_cost;
                pred_edges[next.index()] = Some(edge.id());
                // push() replaces the priority if the node is already queued
                queue.push(next, MinScored(next_cost, ()));
            }
        }
    }
    (costs, pred_edges)
}


/// Reverses the ordering of a score so that a max-heap pops the smallest score first.  NaN
/// scores sort after every real number.
#[derive(Copy, Clone, Debug)]
pub struct MinScored<K, T>(pub K, pub T);

impl<K: PartialOrd, T> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: PartialOrd, T> Eq for MinScored<K, T> {}

impl<K: PartialOrd, T> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: PartialOrd, T> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        let a = &self.0;
        let b = &other.0;
        if a == b {
            Ordering::Equal
        } else if a < b {
            Ordering::Greater
        } else if a > b {
            Ordering::Less
        } else if a.ne(a) && b.ne(b) {
            // these are the NaN cases
            Ordering::Equal
        } else if a.ne(a) {
            // Order NaN less, so that it is last in the MinScore order
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}
