use std::collections::BTreeMap;

use super::cost_function::CostFunction;
use super::error::{TapError, TapResult};
use super::NodeId;


/// A network and demand matrix as read from input, before any solver-specific structures are
/// built.  Links are keyed by (from, to) so every consumer sees them in the same order.
#[derive(Clone, Debug, Default)]
pub struct InputGraph {
    declared_nodes: usize,
    links: BTreeMap<(NodeId, NodeId), CostFunction>,
    demand: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
}

impl InputGraph {
    pub fn new() -> InputGraph {
        InputGraph::default()
    }

    pub fn set_nodes(&mut self, num_nodes: usize) {
        self.declared_nodes = num_nodes;
    }

    /// Adds a directed link.  A second link between the same pair replaces the first.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, cost_fn: CostFunction) {
        if self.links.insert((from, to), cost_fn).is_some() {
            log::warn!("Link {} -> {} was given twice, keeping the last one", from, to);
        }
    }

    /// Adds `amount` of demand from `from` to `to`, accumulating over repeated entries.
    pub fn add_demand(&mut self, from: NodeId, to: NodeId, amount: f64) {
        if from == to || !(amount > 0.) {
            return;
        }
        *self.demand.entry(from).or_insert_with(BTreeMap::new).entry(to).or_insert(0.) += amount;
    }

    /// The number of nodes: the declared count, or more if links or demand name higher ids.
    pub fn num_nodes(&self) -> usize {
        let max_link = self.links.keys().map(|(ff, tt)| ff.max(tt) + 1).max().unwrap_or(0);
        let max_demand = self.demand.iter()
            .flat_map(|(ff, dests)| dests.keys().map(move |tt| ff.max(tt) + 1))
            .max()
            .unwrap_or(0);
        self.declared_nodes.max(max_link).max(max_demand)
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn links(&self) -> impl Iterator<Item = (NodeId, NodeId, &CostFunction)> {
        self.links.iter().map(|(&(ff, tt), cf)| (ff, tt, cf))
    }

    /// Demand grouped by origin, in increasing origin and destination order.
    pub fn demand(&self) -> &BTreeMap<NodeId, BTreeMap<NodeId, f64>> {
        &self.demand
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.values().flat_map(|dests| dests.values()).sum()
    }

    /// Checks that every link and demand entry fits in the declared node count, if one was
    /// declared.
    pub fn validate(&self) -> TapResult<()> {
        if self.declared_nodes == 0 {
            return Ok(());
        }
        let num_nodes = self.declared_nodes;
        let link_nodes = self.links.keys().flat_map(|&(ff, tt)| vec![ff, tt]);
        let demand_nodes = self.demand.iter()
            .flat_map(|(&ff, dests)| std::iter::once(ff).chain(dests.keys().cloned()));
        match link_nodes.chain(demand_nodes).find(|&node| node >= num_nodes) {
            Some(node) => Err(TapError::InvalidNode { node, num_nodes }),
            None => Ok(()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_accumulates() {
        let mut ig = InputGraph::new();
        ig.add_demand(0, 2, 5.);
        ig.add_demand(0, 2, 2.5);
        ig.add_demand(1, 1, 4.);
        ig.add_demand(1, 2, 0.);
        ig.add_demand(1, 2, -3.);
        assert_eq!(ig.demand().len(), 1);
        assert_eq!(ig.demand()[&0][&2], 7.5);
        assert_eq!(ig.total_demand(), 7.5);
    }

    #[test]
    fn test_num_nodes_and_validate() {
        let mut ig = InputGraph::new();
        ig.add_edge(0, 1, CostFunction::constant(1.));
        ig.add_edge(1, 5, CostFunction::constant(1.));
        ig.add_edge(1, 5, CostFunction::constant(2.));
        assert_eq!(ig.num_links(), 2);
        assert_eq!(ig.num_nodes(), 6);
        assert!(ig.validate().is_ok());

        ig.set_nodes(4);
        assert_eq!(ig.num_nodes(), 6);
        match ig.validate() {
            Err(TapError::InvalidNode { node, num_nodes }) => {
                assert_eq!(node, 5);
                assert_eq!(num_nodes, 4);
            }
            other => panic!("expected InvalidNode, got {:?}", other),
        }
        let (_, _, cf) = ig.links().last().unwrap();
        assert_eq!(cf.eval(0.), 2.);
    }
}
